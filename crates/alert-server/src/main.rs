//! Price alert monitor: quote polling task + Telegram webhook server.

use std::path::PathBuf;

use alert_server::config::Config;
use alert_server::server;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "alert-server")]
#[clap(about = "Polls stock quotes and sends a Telegram alert when a threshold is crossed")]
struct Cli {
    /// HTTP port (overrides PORT)
    #[clap(short, long)]
    port: Option<u16>,

    /// Store file (overrides STORE_PATH)
    #[clap(short, long)]
    store: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG still wins when set)
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    tracing::info!(
        addr = %config.socket_addr_string(),
        store = %config.store_path.display(),
        "Starting alert-server"
    );

    server::run(config).await
}
