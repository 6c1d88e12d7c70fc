//! Polling scheduler.
//!
//! Decides, for a given local wall-clock time, whether the monitor should
//! poll quotes now and how long it should sleep afterwards. It also tracks
//! market close: the first plan made outside the window after being inside
//! it (or the very first plan, if made outside) asks for an alert reset.
//!
//! The scheduler never sleeps itself; the monitor task owns the timer.

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::window::TradingWindow;

/// Lower bound for any sleep, so a misconfiguration cannot spin.
const MIN_SLEEP: Duration = Duration::from_secs(1);

/// What the monitor should do for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePlan {
    /// Inside the window: poll every ticker, then sleep.
    Poll { then_sleep: Duration },

    /// Outside the window: do not poll. Re-arm all alerts first when
    /// `reset_alerts` is set, then sleep.
    Idle { reset_alerts: bool, sleep: Duration },
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    /// `None` means "always open": poll forever, never auto-reset.
    window: Option<TradingWindow>,
    poll_interval: Duration,
    max_idle: Duration,
    was_open: Option<bool>,
}

impl Scheduler {
    pub fn new(window: Option<TradingWindow>, poll_interval: Duration, max_idle: Duration) -> Self {
        Scheduler {
            window,
            poll_interval: poll_interval.max(MIN_SLEEP),
            max_idle: max_idle.max(MIN_SLEEP),
            was_open: None,
        }
    }

    /// A scheduler without a trading window.
    pub fn always_on(poll_interval: Duration) -> Self {
        Scheduler::new(None, poll_interval, poll_interval)
    }

    pub fn window(&self) -> Option<&TradingWindow> {
        self.window.as_ref()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Plan the iteration starting at local time `now`.
    pub fn plan(&mut self, now: NaiveDateTime) -> CyclePlan {
        let Some(window) = &self.window else {
            return CyclePlan::Poll {
                then_sleep: self.poll_interval,
            };
        };

        let open = window.contains(now);
        let previous = self.was_open.replace(open);

        if open {
            return CyclePlan::Poll {
                then_sleep: self.poll_interval,
            };
        }

        CyclePlan::Idle {
            // Unknown previous state counts as a close: after a restart we
            // cannot know whether a session ended while we were down.
            reset_alerts: previous != Some(false),
            sleep: window
                .until_next_open(now)
                .min(self.max_idle)
                .max(MIN_SLEEP),
        }
    }
}
