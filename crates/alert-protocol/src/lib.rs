//! alert-protocol
//!
//! Text-level encoding/decoding for the price alert monitor.
//!
//! This crate turns chat text into logical `alert_core::Command`s and
//! logical replies / alert events back into human-readable text.
//!
//! - [`command_codec`] : chat command parsing (`/add VALE3.SA 67.5`)
//! - [`text_format`]   : reply, usage and alert message rendering
//! - [`wire_types`]    : Telegram Bot API payloads (webhook update, sendMessage)

pub mod command_codec;
pub mod text_format;
pub mod wire_types;

pub use command_codec::{parse_command, CommandKind, ParseError};
pub use text_format::{format_alert, format_parse_error, format_reply, help_text};
