//! Message types used by the core alert logic.
//!
//! These are **transport-agnostic** logical messages:
//! - [`Command`]: what a chat user asks the store to do.
//! - [`Reply`]: what the store answers.
//! - [`AlertEvent`]: what the evaluator emits when a threshold is crossed.
//!
//! Note: parsing chat text and rendering human-readable text live in the
//! `alert-protocol` crate; this module is purely logical.

use rust_decimal::Decimal;

use crate::alert_state::AlertState;
use crate::ticker::Ticker;

/// A request into the config store, usually parsed from a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every tracked ticker with its limit and alert state.
    List,

    /// Add a ticker or update its limit. Always re-arms the ticker.
    SetThreshold { ticker: Ticker, limit: Decimal },

    /// Stop tracking a ticker.
    Remove { ticker: Ticker },

    /// Re-arm every ticker.
    ResetAlerts,

    /// Show the available commands.
    Help,
}

/// The store's answer to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Listing(Vec<TickerStatus>),

    ThresholdSet {
        ticker: Ticker,
        limit: Decimal,
        outcome: SetOutcome,
    },

    Removed {
        ticker: Ticker,
        /// False when the ticker was not tracked to begin with.
        existed: bool,
    },

    AlertsReset,

    Help,
}

/// Whether `set_threshold` created a new entry or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Added,
    Updated { previous: Decimal },
}

/// One row of a store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerStatus {
    pub ticker: Ticker,
    pub limit: Decimal,
    pub state: AlertState,
}

/// A threshold crossing for an armed ticker (output of the evaluator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    /// Instrument symbol.
    pub ticker: Ticker,

    /// Price that crossed the limit.
    pub price: Decimal,

    /// Configured limit at the time of the crossing.
    pub limit: Decimal,
}

impl Reply {
    /// Convenience constructor for a set-threshold reply.
    pub fn threshold_set(ticker: Ticker, limit: Decimal, outcome: SetOutcome) -> Self {
        Reply::ThresholdSet {
            ticker,
            limit,
            outcome,
        }
    }
}
