//! alert-core
//!
//! Pure price-alert logic:
//! - tickers and per-ticker alert state (ARMED / FIRED)
//! - the durable ticker -> threshold config store
//! - price evaluation against a threshold
//! - trading window and polling scheduler
//! - chat commands and their replies

pub mod ticker;
pub mod alert_state;
pub mod messages;
pub mod store;
pub mod evaluator;
pub mod window;
pub mod scheduler;
pub mod error;

pub use ticker::Ticker;
pub use alert_state::AlertState;

pub use messages::{
    AlertEvent,
    Command,
    Reply,
    SetOutcome,
    TickerStatus,
};

pub use store::ConfigStore;
pub use evaluator::{evaluate, Evaluation};
pub use window::TradingWindow;
pub use scheduler::{CyclePlan, Scheduler};
pub use error::{StoreError, TickerError, WindowError};
