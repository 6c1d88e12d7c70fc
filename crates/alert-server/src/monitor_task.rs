//! Central monitor loop.
//!
//! This task owns the polling `Scheduler` and, on every iteration:
//! - asks the scheduler what to do at the current exchange-local time,
//! - inside the window, polls every tracked ticker once (store order),
//!   delivers alerts for armed tickers at or above their limit and marks
//!   them fired,
//! - at market close, re-arms every ticker,
//! - sleeps for whatever the scheduler decided.
//!
//! Quote and delivery failures are logged and skipped; they never stop
//! the loop. A ticker is marked fired only after its alert was delivered,
//! so a failed delivery is retried on the next cycle. Once delivered it
//! stays fired in memory even if the store file cannot be written; the
//! write is retried at the start of each cycle. A close reset that fails
//! to save is retried on every following step until it succeeds.

use std::sync::Arc;
use std::time::Duration;

use alert_core::{evaluate, CyclePlan, Evaluation, Scheduler, Ticker};
use alert_protocol::text_format::{format_alert, STARTUP_MESSAGE};
use alert_protocol::wire_types::ChatId;
use chrono::{FixedOffset, NaiveDateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::notifier::Notifier;
use crate::quote::QuoteSource;
use crate::types::{mutate_store, SharedStore};

/// Outcome of one polling cycle, mostly for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Tickers whose price was fetched and evaluated.
    pub checked: usize,
    /// Tickers whose alert was delivered this cycle.
    pub fired: Vec<Ticker>,
    /// Tickers skipped because no quote was available.
    pub no_quote: Vec<Ticker>,
    /// Tickers that crossed but whose alert could not be delivered.
    pub undelivered: Vec<Ticker>,
}

pub struct Monitor {
    store: SharedStore,
    quotes: Arc<dyn QuoteSource>,
    notifier: Arc<dyn Notifier>,
    admin_chat: ChatId,
    scheduler: Scheduler,
    utc_offset: FixedOffset,
    /// A market-close re-arm that has not been saved yet.
    pending_reset: bool,
}

impl Monitor {
    pub fn new(
        store: SharedStore,
        quotes: Arc<dyn QuoteSource>,
        notifier: Arc<dyn Notifier>,
        admin_chat: ChatId,
        scheduler: Scheduler,
        utc_offset: FixedOffset,
    ) -> Self {
        Monitor {
            store,
            quotes,
            notifier,
            admin_chat,
            scheduler,
            utc_offset,
            pending_reset: false,
        }
    }

    /// Run forever. Only one monitor may run per process.
    pub async fn run(mut self) {
        info!(
            window = ?self.scheduler.window(),
            poll_interval = ?self.scheduler.poll_interval(),
            "Monitor started"
        );
        if let Err(e) = self.notifier.send(self.admin_chat, STARTUP_MESSAGE).await {
            warn!(error = %e, "Failed to send startup notice");
        }

        loop {
            let now = Utc::now().with_timezone(&self.utc_offset).naive_local();
            let pause = self.step(now).await;
            tokio::time::sleep(pause).await;
        }
    }

    /// One scheduler iteration at exchange-local time `now`.
    /// Returns how long to sleep before the next one.
    pub async fn step(&mut self, now: NaiveDateTime) -> Duration {
        match self.scheduler.plan(now) {
            CyclePlan::Poll { then_sleep } => {
                if self.pending_reset {
                    self.reset_after_close().await;
                }
                let report = self.run_cycle().await;
                info!(
                    checked = report.checked,
                    fired = report.fired.len(),
                    no_quote = report.no_quote.len(),
                    undelivered = report.undelivered.len(),
                    "Cycle complete"
                );
                then_sleep
            }
            CyclePlan::Idle {
                reset_alerts,
                sleep,
            } => {
                if reset_alerts || self.pending_reset {
                    self.pending_reset = true;
                    self.reset_after_close().await;
                }
                debug!(?sleep, "Market closed, idling");
                sleep
            }
        }
    }

    /// Poll every tracked ticker once.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        self.flush_unsaved().await;

        // Snapshot the tickers so no lock is held across network calls.
        let tickers: Vec<Ticker> = {
            let store = self.store.read().await;
            store.list().into_iter().map(|s| s.ticker).collect()
        };

        for ticker in tickers {
            let price = match self.quotes.latest_price(&ticker).await {
                Ok(price) => price,
                Err(e) => {
                    warn!(%ticker, error = %e, "No quote, skipping");
                    report.no_quote.push(ticker);
                    continue;
                }
            };

            // Re-read: a command may have changed or removed the ticker
            // while the quote was in flight.
            let current = {
                let store = self.store.read().await;
                store
                    .get_threshold(ticker.as_str())
                    .map(|limit| (limit, store.get_alert_state(ticker.as_str())))
            };
            let Some((limit, state)) = current else {
                debug!(%ticker, "Ticker removed during cycle");
                continue;
            };

            report.checked += 1;
            debug!(%ticker, %price, %limit, state = state.as_str(), "Quote");

            let event = match evaluate(&ticker, limit, state, price) {
                Evaluation::Crossed(event) => event,
                Evaluation::Below | Evaluation::AlreadyFired => continue,
            };

            if let Err(e) = self.notifier.send(self.admin_chat, &format_alert(&event)).await {
                warn!(%ticker, error = %e, "Alert delivery failed, will retry next cycle");
                report.undelivered.push(ticker);
                continue;
            }

            info!(%ticker, %price, %limit, "Alert sent");
            let key = ticker.clone();
            match mutate_store(&self.store, move |s| s.mark_fired(key.as_str())).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!(%ticker, error = %e, "Failed to persist fired alert"),
                Err(e) => error!(%ticker, error = %e, "Store task failed"),
            }
            report.fired.push(ticker);
        }

        report
    }

    async fn reset_after_close(&mut self) {
        match mutate_store(&self.store, |s| s.reset_all_alerts()).await {
            Ok(Ok(())) => {
                self.pending_reset = false;
                info!("Market closed, alerts re-armed");
            }
            Ok(Err(e)) => error!(error = %e, "Failed to re-arm alerts at market close, will retry"),
            Err(e) => error!(error = %e, "Store task failed, will retry re-arm"),
        }
    }

    /// Retry writing a fired flag whose earlier save failed.
    async fn flush_unsaved(&self) {
        if !self.store.read().await.has_unsaved_changes() {
            return;
        }
        match mutate_store(&self.store, |s| s.flush()).await {
            Ok(Ok(())) => info!("Unsaved alert state written"),
            Ok(Err(e)) => warn!(error = %e, "Store still not writable"),
            Err(e) => error!(error = %e, "Store task failed"),
        }
    }
}
