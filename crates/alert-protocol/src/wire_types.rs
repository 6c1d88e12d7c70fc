//! Telegram Bot API payloads.
//!
//! Only the fields the monitor reads or writes are modelled. Every inbound
//! field is optional so that unexpected update kinds (channel posts,
//! callback queries, ...) still deserialize and are simply ignored.

use serde::{Deserialize, Serialize};

/// Header carrying the secret configured with `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Identifier of a Telegram chat (user, group or channel).
pub type ChatId = i64;

/// Inbound webhook update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,

    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,

    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

impl Update {
    /// Chat and text of a plain text message, if this update carries one.
    pub fn text_message(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, text))
    }
}

/// Outbound `sendMessage` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
    pub disable_web_page_preview: bool,
}

impl<'a> SendMessage<'a> {
    pub fn new(chat_id: ChatId, text: &'a str) -> Self {
        SendMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
        }
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,

    #[serde(default)]
    pub description: Option<String>,
}
