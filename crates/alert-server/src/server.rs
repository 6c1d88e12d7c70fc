//! HTTP listener and top-level wiring.
//!
//! This module:
//! - Opens (or creates) the config store.
//! - Builds the quote source and the Telegram notifier.
//! - Spawns the single monitor task.
//! - Serves the webhook and health routes until Ctrl-C / SIGTERM.
//!
//! The monitor loop and the webhook logic live in `monitor_task` and
//! `webhook` respectively.

use std::sync::Arc;

use alert_core::ConfigStore;
use anyhow::Context;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::monitor_task::Monitor;
use crate::notifier::{Notifier, TelegramNotifier};
use crate::quote::{QuoteSource, YahooQuoteSource};
use crate::types::{shared_store, AppState};
use crate::webhook::handle_webhook;

const HOME_BANNER: &str = "Price alert monitor online";

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/", get(home))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> &'static str {
    HOME_BANNER
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Run the monitor and the HTTP server with the given configuration.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = ConfigStore::open(&config.store_path, config.default_entry.clone())
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    info!(path = %store.path().display(), tickers = store.len(), "Config store ready");
    let store = shared_store(store);

    let notifier: Arc<dyn Notifier> = Arc::new(
        TelegramNotifier::new(&config.telegram_api_base, &config.bot_token, config.http_timeout)
            .context("building Telegram client")?,
    );
    let quotes: Arc<dyn QuoteSource> = Arc::new(
        YahooQuoteSource::new(&config.quote_api_base, config.http_timeout)
            .context("building quote client")?,
    );

    // Exactly one monitor per process: a second one would double-fire.
    let monitor = Monitor::new(
        store.clone(),
        quotes,
        notifier.clone(),
        config.admin_chat_id,
        config.scheduler(),
        config.utc_offset,
    );
    tokio::spawn(monitor.run());

    let state = AppState {
        store,
        notifier,
        webhook_secret: config.webhook_secret.clone(),
    };

    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
