//! Outbound message delivery.
//!
//! The [`Notifier`] trait is the seam between the monitor / webhook logic
//! and the messaging API; [`TelegramNotifier`] is the production channel.

use std::time::Duration;

use alert_protocol::wire_types::{ApiResponse, ChatId, SendMessage};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::Secret;

/// Errors that can occur when delivering a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status or `ok: false`
    #[error("messaging API rejected the message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Trait for message delivery channels.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `chat_id`.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API `sendMessage` channel.
pub struct TelegramNotifier {
    /// `{api_base}/bot{token}`
    bot_url: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, token: &Secret, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(api_base, token, client))
    }

    pub fn with_client(api_base: &str, token: &Secret, client: reqwest::Client) -> Self {
        TelegramNotifier {
            bot_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token.expose()),
            client,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}/sendMessage", self.bot_url))
            .json(&SendMessage::new(chat_id, text))
            .send()
            .await?;

        let status = response.status();
        // The Bot API answers errors with a JSON body too; fall back to the
        // raw status when it doesn't.
        let body: Option<ApiResponse> = response.json().await.ok();

        match body {
            Some(api) if status.is_success() && api.ok => {
                debug!(chat_id, "Message delivered");
                Ok(())
            }
            Some(api) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: api.description.unwrap_or_else(|| "no description".to_string()),
            }),
            None if status.is_success() => Ok(()),
            None => Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: status.canonical_reason().unwrap_or("unknown").to_string(),
            }),
        }
    }
}
