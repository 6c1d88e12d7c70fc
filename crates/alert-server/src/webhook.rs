//! Telegram webhook handling.
//!
//! Each update carrying a text message is parsed as a chat command,
//! applied to the config store, and answered in the same chat. Telegram
//! always gets `200 OK` back (otherwise it keeps redelivering the update),
//! except when a webhook secret is configured and the request lacks it
//! (`401`) or the body is not an update at all (`400`).

use alert_protocol::wire_types::{Update, SECRET_TOKEN_HEADER};
use alert_protocol::{format_parse_error, format_reply, parse_command};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, error, info, warn};

use crate::types::{mutate_store, AppState, SharedStore};

/// `POST /webhook`
///
/// The secret header is checked before the body is decoded, so an
/// unauthenticated caller always gets `401`.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    if let Some(secret) = &state.webhook_secret {
        let presented = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(secret.expose()) {
            warn!("Webhook call with wrong secret token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Undecodable webhook body");
        StatusCode::BAD_REQUEST
    })?;

    let Some((chat_id, text)) = update.text_message() else {
        debug!(update_id = ?update.update_id, "Ignoring update without text");
        return Ok("OK");
    };
    info!(chat_id, text, "Command received");

    if let Some(answer) = respond_to(&state.store, text).await {
        if let Err(e) = state.notifier.send(chat_id, &answer).await {
            warn!(chat_id, error = %e, "Failed to answer command");
        }
    }

    Ok("OK")
}

/// Run one chat message against the store and render the answer.
///
/// Returns `None` for blank messages.
pub async fn respond_to(store: &SharedStore, text: &str) -> Option<String> {
    let answer = match parse_command(text)? {
        Err(e) => {
            debug!(error = %e, "Malformed command");
            format_parse_error(&e)
        }
        Ok(command) => {
            match mutate_store(store, move |s| s.apply(command)).await {
                Ok(Ok(reply)) => format_reply(&reply),
                Ok(Err(e)) => {
                    error!(error = %e, "Failed to persist command");
                    format!("⚠ The change could not be saved, please try again.\n({})", e)
                }
                Err(e) => {
                    error!(error = %e, "Store task failed");
                    "⚠ The change could not be saved, please try again.".to_string()
                }
            }
        }
    };
    Some(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::{AlertState, ConfigStore};
    use tempfile::TempDir;

    use crate::types::shared_store;

    fn store(dir: &TempDir) -> SharedStore {
        shared_store(ConfigStore::open(dir.path().join("config.json"), None).unwrap())
    }

    #[tokio::test]
    async fn add_then_list() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let answer = respond_to(&store, "/add petr4.sa 40").await.unwrap();
        assert_eq!(answer, "✔ PETR4.SA added with limit 40");

        let answer = respond_to(&store, "/list").await.unwrap();
        assert!(answer.contains("PETR4.SA -> limit 40 [armed]"));
    }

    #[tokio::test]
    async fn usage_on_malformed_command_leaves_store_alone() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let answer = respond_to(&store, "/add VALE3.SA").await.unwrap();
        assert!(answer.contains("Usage:"));
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn reset_rearms_fired_tickers() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        respond_to(&store, "/add XYZ 1").await.unwrap();
        store.write().await.mark_fired("XYZ").unwrap();

        let answer = respond_to(&store, "/continuar").await.unwrap();
        assert!(answer.contains("re-armed"));
        assert_eq!(store.read().await.get_alert_state("XYZ"), AlertState::Armed);
    }

    #[tokio::test]
    async fn blank_message_gets_no_answer() {
        let dir = TempDir::new().unwrap();
        assert!(respond_to(&store(&dir), "  ").await.is_none());
    }
}
