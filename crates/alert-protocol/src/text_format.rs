//! Human-readable message text.
//!
//! Output format (logical message -> chat text):
//!
//! - Alert:
//!   `🚨 ALERT: TICKER reached PRICE (limit LIMIT)`
//!
//! - Listing (one line per ticker):
//!   `• TICKER -> limit LIMIT [armed|fired]`
//!
//! - Threshold set:
//!   `✔ TICKER added with limit LIMIT` / `✔ TICKER limit updated to LIMIT (was PREV)`
//!
//! Prices in alerts are shown with two decimals; limits are shown as the
//! user entered them.

use alert_core::{AlertEvent, Reply, SetOutcome, TickerStatus};

use crate::command_codec::{CommandKind, ParseError};

/// Sent to the admin chat when the monitor starts.
pub const STARTUP_MESSAGE: &str = "🚀 Price alert monitor started.";

/// Render a delivered alert.
pub fn format_alert(event: &AlertEvent) -> String {
    format!(
        "🚨 ALERT: {} reached {:.2}\n🎯 Configured limit: {}",
        event.ticker, event.price, event.limit
    )
}

/// Render the store's answer to a command.
pub fn format_reply(reply: &Reply) -> String {
    match reply {
        Reply::Listing(rows) => format_listing(rows),
        Reply::ThresholdSet {
            ticker,
            limit,
            outcome,
        } => match outcome {
            SetOutcome::Added => format!("✔ {} added with limit {}", ticker, limit),
            SetOutcome::Updated { previous } => {
                format!("✔ {} limit updated to {} (was {})", ticker, limit, previous)
            }
        },
        Reply::Removed { ticker, existed } => {
            if *existed {
                format!("❌ {} removed from monitoring", ticker)
            } else {
                format!("{} was not being monitored", ticker)
            }
        }
        Reply::AlertsReset => "🔔 Alerts re-armed.".to_string(),
        Reply::Help => help_text().to_string(),
    }
}

fn format_listing(rows: &[TickerStatus]) -> String {
    if rows.is_empty() {
        return "📌 No tickers monitored. Use /add TICKER VALUE.".to_string();
    }

    let mut out = String::from("📌 Monitored tickers:\n");
    for row in rows {
        out.push_str(&format!(
            "\n• {} -> limit {} [{}]",
            row.ticker,
            row.limit,
            row.state.as_str()
        ));
    }
    out
}

/// Render a malformed command as reason + usage.
pub fn format_parse_error(err: &ParseError) -> String {
    format!("{}\nUsage:\n{}", err, usage(err.command()))
}

/// Usage line for one command.
pub fn usage(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::List => "/list",
        CommandKind::Add => "/add TICKER VALUE   (e.g. /add PETR4.SA 40)",
        CommandKind::Set => "/set TICKER VALUE   (e.g. /set VALE3.SA 67.5)",
        CommandKind::Remove => "/remove TICKER   (e.g. /remove VALE3.SA)",
        CommandKind::Reset => "/reset",
        CommandKind::Help => "/help",
    }
}

pub fn help_text() -> &'static str {
    "Available commands:\n\
     /list - monitored tickers and limits\n\
     /add TICKER VALUE - start monitoring a ticker\n\
     /set TICKER VALUE - change a ticker's limit\n\
     /remove TICKER - stop monitoring a ticker\n\
     /reset - re-arm all alerts"
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::{AlertState, Ticker};
    use rust_decimal_macros::dec;

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    #[test]
    fn alert_shows_two_decimal_price() {
        let text = format_alert(&AlertEvent {
            ticker: ticker("VALE3.SA"),
            price: dec!(65.1234),
            limit: dec!(65.0),
        });
        assert!(text.contains("VALE3.SA reached 65.12"));
        assert!(text.contains("limit: 65.0"));
    }

    #[test]
    fn listing_shows_state() {
        let text = format_reply(&Reply::Listing(vec![
            TickerStatus {
                ticker: ticker("A"),
                limit: dec!(1.5),
                state: AlertState::Armed,
            },
            TickerStatus {
                ticker: ticker("B"),
                limit: dec!(2),
                state: AlertState::Fired,
            },
        ]));
        assert!(text.contains("• A -> limit 1.5 [armed]"));
        assert!(text.contains("• B -> limit 2 [fired]"));
    }

    #[test]
    fn empty_listing_hints_at_add() {
        assert!(format_reply(&Reply::Listing(vec![])).contains("/add"));
    }

    #[test]
    fn set_reply_distinguishes_add_and_update() {
        let added = format_reply(&Reply::threshold_set(ticker("ABC"), dec!(40.0), SetOutcome::Added));
        assert_eq!(added, "✔ ABC added with limit 40.0");

        let updated = format_reply(&Reply::threshold_set(
            ticker("ABC"),
            dec!(50.0),
            SetOutcome::Updated { previous: dec!(40.0) },
        ));
        assert_eq!(updated, "✔ ABC limit updated to 50.0 (was 40.0)");
    }

    #[test]
    fn parse_error_includes_usage() {
        let err = ParseError::ArgumentCount {
            command: CommandKind::Remove,
            got: 0,
        };
        let text = format_parse_error(&err);
        assert!(text.contains("Usage:"));
        assert!(text.contains("/remove TICKER"));
    }
}
