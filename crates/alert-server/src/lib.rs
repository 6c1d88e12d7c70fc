//! alert-server
//!
//! Price alert monitor: a background task polling quotes and a small
//! HTTP server receiving Telegram webhook commands.

pub mod config;
pub mod types;
pub mod server;
pub mod notifier;
pub mod quote;
pub mod monitor_task;
pub mod webhook;
