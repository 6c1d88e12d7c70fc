//! Trading window: the wall-clock interval during which polling is active.
//!
//! A window is `[open, close)` on a set of weekdays, evaluated on local
//! (exchange) wall-clock time. Converting "now" into that local time is the
//! caller's job; this module only sees `NaiveDateTime`s.

use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

use crate::error::WindowError;

/// Days and hours during which the market is considered open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingWindow {
    open: NaiveTime,
    close: NaiveTime,
    /// Indexed by `Weekday::num_days_from_monday()`.
    days: [bool; 7],
}

impl TradingWindow {
    /// Build a window; `open` must be strictly before `close`.
    pub fn new(open: NaiveTime, close: NaiveTime, days: &[Weekday]) -> Result<Self, WindowError> {
        if open >= close {
            return Err(WindowError::EmptyWindow {
                open: open.format("%H:%M").to_string(),
                close: close.format("%H:%M").to_string(),
            });
        }
        if days.is_empty() {
            return Err(WindowError::NoDays);
        }

        let mut mask = [false; 7];
        for day in days {
            mask[day.num_days_from_monday() as usize] = true;
        }

        Ok(TradingWindow {
            open,
            close,
            days: mask,
        })
    }

    /// Parse `"HH:MM"` times and a day list such as `"mon-fri"` or `"mon,wed,fri"`.
    pub fn parse(open: &str, close: &str, days: &str) -> Result<Self, WindowError> {
        let open = parse_time(open)?;
        let close = parse_time(close)?;
        let days = parse_weekdays(days)?;
        TradingWindow::new(open, close, &days)
    }

    pub fn trades_on(&self, day: Weekday) -> bool {
        self.days[day.num_days_from_monday() as usize]
    }

    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        let time = now.time();
        self.trades_on(now.weekday()) && time >= self.open && time < self.close
    }

    /// Time from `now` until the next window open strictly after `now`.
    pub fn until_next_open(&self, now: NaiveDateTime) -> Duration {
        // Every weekday is reachable within a week, and `new` guarantees
        // at least one trading day, so the loop always finds a candidate.
        for offset in 0..=7 {
            let date = now.date() + TimeDelta::days(offset);
            if !self.trades_on(date.weekday()) {
                continue;
            }
            let candidate = date.and_time(self.open);
            if candidate > now {
                return (candidate - now).to_std().unwrap_or_default();
            }
        }
        Duration::ZERO
    }
}

impl Default for TradingWindow {
    /// 10:00 to 17:00, Monday to Friday.
    fn default() -> Self {
        TradingWindow {
            open: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            days: [true, true, true, true, true, false, false],
        }
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, WindowError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| WindowError::InvalidTime(s.to_string()))
}

/// Parse a comma-separated list of days or day ranges. Ranges may wrap
/// around the end of the week (`"sat-mon"`).
pub fn parse_weekdays(list: &str) -> Result<Vec<Weekday>, WindowError> {
    let mut days = Vec::new();

    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from = parse_weekday(from)?;
                let to = parse_weekday(to)?;
                let mut day = from;
                loop {
                    days.push(day);
                    if day == to {
                        break;
                    }
                    day = day.succ();
                }
            }
            None => days.push(parse_weekday(part)?),
        }
    }

    if days.is_empty() {
        return Err(WindowError::NoDays);
    }
    Ok(days)
}

fn parse_weekday(s: &str) -> Result<Weekday, WindowError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| WindowError::UnknownWeekday(s.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    // 2024-06-03 is a Monday.

    #[test]
    fn contains_is_half_open() {
        let w = TradingWindow::default();
        assert!(!w.contains(at(2024, 6, 3, 9, 59)));
        assert!(w.contains(at(2024, 6, 3, 10, 0)));
        assert!(w.contains(at(2024, 6, 3, 16, 59)));
        assert!(!w.contains(at(2024, 6, 3, 17, 0)));
    }

    #[test]
    fn weekend_is_closed() {
        let w = TradingWindow::default();
        assert!(!w.contains(at(2024, 6, 8, 12, 0)));
        assert!(!w.contains(at(2024, 6, 9, 12, 0)));
    }

    #[test]
    fn next_open_same_day_before_open() {
        let w = TradingWindow::default();
        assert_eq!(
            w.until_next_open(at(2024, 6, 3, 9, 30)),
            Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn next_open_after_friday_close_is_monday() {
        let w = TradingWindow::default();
        // Friday 17:00 -> Monday 10:00 = 2 days 17 hours.
        assert_eq!(
            w.until_next_open(at(2024, 6, 7, 17, 0)),
            Duration::from_secs((2 * 24 + 17) * 3600)
        );
    }

    #[test]
    fn parses_ranges_and_lists() {
        assert_eq!(
            parse_weekdays("mon-wed, fri").unwrap(),
            vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Fri]
        );
        assert_eq!(
            parse_weekdays("sat-mon").unwrap(),
            vec![Weekday::Sat, Weekday::Sun, Weekday::Mon]
        );
        assert_eq!(
            parse_weekdays("funday"),
            Err(WindowError::UnknownWeekday("funday".to_string()))
        );
        assert_eq!(parse_weekdays(" , "), Err(WindowError::NoDays));
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(matches!(
            TradingWindow::parse("17:00", "10:00", "mon-fri"),
            Err(WindowError::EmptyWindow { .. })
        ));
        assert!(matches!(
            TradingWindow::parse("25:00", "26:00", "mon"),
            Err(WindowError::InvalidTime(_))
        ));
    }

    #[test]
    fn parse_matches_default() {
        assert_eq!(
            TradingWindow::parse("10:00", "17:00", "mon-fri").unwrap(),
            TradingWindow::default()
        );
    }
}
