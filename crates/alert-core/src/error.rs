//! Error types for the core crate.
//!
//! Evaluation and scheduling are infallible once their inputs exist;
//! errors only come from building those inputs (tickers, windows) and
//! from persisting the store.

use std::path::PathBuf;

use thiserror::Error;

/// A ticker string that cannot be tracked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker is empty")]
    Empty,

    #[error("ticker {0:?} contains unsupported characters")]
    InvalidCharacters(String),
}

/// Failures while loading or persisting the config store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid trading window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window opens at {open} but closes at {close}")]
    EmptyWindow { open: String, close: String },

    #[error("invalid time of day {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("unknown weekday {0:?}")]
    UnknownWeekday(String),

    #[error("no trading days configured")]
    NoDays,
}
