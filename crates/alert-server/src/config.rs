//! Configuration for the alert monitor.
//!
//! Everything comes from environment variables, falling back to defaults
//! where one makes sense:
//!
//! - `BOT_TOKEN`           (required) Telegram bot token
//! - `CHAT_ID`             (required) chat that receives price alerts
//! - `BIND_ADDR`           (default: "0.0.0.0")
//! - `PORT`                (default: "8080")
//! - `STORE_PATH`          (default: "config.json")
//! - `DEFAULT_TICKER`      (default: "VALE3.SA", empty for none)
//! - `DEFAULT_LIMIT`       (default: "65.0")
//! - `POLL_INTERVAL_SECS`  (default: "600")
//! - `IDLE_MAX_SECS`       (default: "300")
//! - `MARKET_WINDOW`       (default: "on"; "off" polls around the clock)
//! - `MARKET_OPEN`         (default: "10:00")
//! - `MARKET_CLOSE`        (default: "17:00")
//! - `MARKET_DAYS`         (default: "mon-fri")
//! - `MARKET_UTC_OFFSET`   (default: "-03:00")
//! - `TELEGRAM_API_BASE`   (default: "https://api.telegram.org")
//! - `QUOTE_API_BASE`      (default: "https://query1.finance.yahoo.com")
//! - `HTTP_TIMEOUT_SECS`   (default: "10")
//! - `WEBHOOK_SECRET`      (optional) expected secret token header

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alert_core::{Scheduler, Ticker, TradingWindow, WindowError};
use alert_protocol::wire_types::ChatId;
use chrono::FixedOffset;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid market window: {0}")]
    Window(#[from] WindowError),
}

/// A value that must never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// HTTP port for the webhook server.
    pub port: u16,

    pub bot_token: Secret,

    /// Chat that receives price alerts and the startup notice.
    pub admin_chat_id: ChatId,

    /// Location of the persisted config store.
    pub store_path: PathBuf,

    /// Entry written into a brand-new store.
    pub default_entry: Option<(Ticker, Decimal)>,

    pub poll_interval: Duration,

    /// Longest sleep while the market is closed.
    pub idle_max: Duration,

    /// `None` polls around the clock and never auto-resets alerts.
    pub window: Option<TradingWindow>,

    /// Offset of the exchange's wall clock from UTC.
    pub utc_offset: FixedOffset,

    pub telegram_api_base: String,
    pub quote_api_base: String,
    pub http_timeout: Duration,

    pub webhook_secret: Option<Secret>,
}

impl Config {
    /// Construct a `Config` from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Construct a `Config` from any key -> value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = read_or_default(&lookup, "PORT", 8080u16)?;

        let bot_token = lookup("BOT_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new)
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let admin_chat_id = read_required::<ChatId, _>(&lookup, "CHAT_ID")?;

        let store_path =
            PathBuf::from(lookup("STORE_PATH").unwrap_or_else(|| "config.json".to_string()));
        let default_entry = read_default_entry(&lookup)?;

        let poll_interval = Duration::from_secs(read_or_default(&lookup, "POLL_INTERVAL_SECS", 600u64)?);
        let idle_max = Duration::from_secs(read_or_default(&lookup, "IDLE_MAX_SECS", 300u64)?);

        let window = match lookup("MARKET_WINDOW").as_deref().map(str::trim) {
            Some("off") | Some("false") | Some("0") => None,
            _ => Some(TradingWindow::parse(
                &lookup("MARKET_OPEN").unwrap_or_else(|| "10:00".to_string()),
                &lookup("MARKET_CLOSE").unwrap_or_else(|| "17:00".to_string()),
                &lookup("MARKET_DAYS").unwrap_or_else(|| "mon-fri".to_string()),
            )?),
        };

        let offset_raw = lookup("MARKET_UTC_OFFSET").unwrap_or_else(|| "-03:00".to_string());
        let utc_offset = parse_utc_offset(&offset_raw).ok_or_else(|| ConfigError::Invalid {
            key: "MARKET_UTC_OFFSET",
            value: offset_raw.clone(),
            reason: "expected +HH:MM or -HH:MM".to_string(),
        })?;

        let telegram_api_base = lookup("TELEGRAM_API_BASE")
            .unwrap_or_else(|| "https://api.telegram.org".to_string());
        let quote_api_base = lookup("QUOTE_API_BASE")
            .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string());
        let http_timeout = Duration::from_secs(read_or_default(&lookup, "HTTP_TIMEOUT_SECS", 10u64)?);

        let webhook_secret = lookup("WEBHOOK_SECRET")
            .filter(|v| !v.is_empty())
            .map(Secret::new);

        Ok(Config {
            bind_addr,
            port,
            bot_token,
            admin_chat_id,
            store_path,
            default_entry,
            poll_interval,
            idle_max,
            window,
            utc_offset,
            telegram_api_base,
            quote_api_base,
            http_timeout,
            webhook_secret,
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Scheduler matching the configured window and intervals.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.window.clone(), self.poll_interval, self.idle_max)
    }
}

fn read_or_default<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => parse_value(key, &val),
        None => Ok(default),
    }
}

fn read_required<T, F>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(key).ok_or(ConfigError::Missing(key))?;
    parse_value(key, &val)
}

fn parse_value<T>(key: &'static str, val: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    val.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: val.to_string(),
        reason: e.to_string(),
    })
}

fn read_default_entry<F>(lookup: &F) -> Result<Option<(Ticker, Decimal)>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup("DEFAULT_TICKER").unwrap_or_else(|| "VALE3.SA".to_string());
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let ticker = Ticker::parse(&raw).map_err(|e| ConfigError::Invalid {
        key: "DEFAULT_TICKER",
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    let limit: Decimal = read_or_default(lookup, "DEFAULT_LIMIT", Decimal::new(650, 1))?;
    Ok(Some((ticker, limit)))
}

/// Parse `"+HH:MM"`, `"-HH:MM"`, `"HH:MM"` or `"Z"` / `"UTC"`.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'-' => (-1, &raw[1..]),
        b'+' => (1, &raw[1..]),
        _ => (1, raw),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }

    let seconds = hours.checked_mul(3600)?.checked_add(minutes * 60)?;
    FixedOffset::east_opt(sign * seconds)
}
