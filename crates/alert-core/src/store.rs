//! Durable ticker -> threshold config store.
//!
//! Holds two mappings, persisted together as one JSON file:
//! - `thresholds`: ticker -> limit price
//! - `alert_sent`: ticker -> "alert already sent" flag
//!
//! Every user-driven mutation is staged on a copy, written to disk with a
//! write-temp-then-rename, and only then committed in memory. A failed
//! write therefore leaves both memory and disk at the previous state
//! and is reported to the caller.
//!
//! `mark_fired` is the exception: it records a notification that has
//! already gone out, so the flag is set in memory first and stays set even
//! when the write fails. The store then carries unsaved changes until a
//! later [`ConfigStore::flush`] or mutation writes them.
//!
//! Iteration order is insertion order, so listings and monitor cycles
//! visit tickers in the order they were first added.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alert_state::AlertState;
use crate::error::StoreError;
use crate::messages::{Command, Reply, SetOutcome, TickerStatus};
use crate::ticker::Ticker;

/// On-disk layout of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoreData {
    /// `limites` is the key used by older config files.
    #[serde(default, alias = "limites")]
    thresholds: IndexMap<Ticker, Decimal>,

    #[serde(default)]
    alert_sent: IndexMap<Ticker, bool>,
}

impl StoreData {
    /// Restore the invariant: exactly one flag per tracked ticker.
    fn normalised(mut self) -> Self {
        let thresholds = &self.thresholds;
        self.alert_sent.retain(|ticker, _| thresholds.contains_key(ticker));
        for ticker in self.thresholds.keys() {
            if !self.alert_sent.contains_key(ticker) {
                self.alert_sent.insert(ticker.clone(), false);
            }
        }
        self
    }
}

/// The config store shared by the monitor loop and the command handler.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: StoreData,
    /// Memory is ahead of the file.
    unsaved: bool,
}

impl ConfigStore {
    /// Load the store from `path`, or create it if the file does not exist.
    ///
    /// A newly created store holds `default_entry` (if any) and is written
    /// to disk immediately.
    pub fn open(
        path: impl Into<PathBuf>,
        default_entry: Option<(Ticker, Decimal)>,
    ) -> Result<Self, StoreError> {
        let path = path.into();

        match fs::read_to_string(&path) {
            Ok(content) => {
                let data: StoreData =
                    serde_json::from_str(&content).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                let data = data.normalised();
                info!(path = %path.display(), tickers = data.thresholds.len(), "Loaded config store");
                Ok(ConfigStore {
                    path,
                    data,
                    unsaved: false,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut data = StoreData::default();
                if let Some((ticker, limit)) = default_entry {
                    data.thresholds.insert(ticker.clone(), limit);
                    data.alert_sent.insert(ticker, false);
                }
                write_atomic(&path, &data)?;
                info!(path = %path.display(), "Created config store with default entry");
                Ok(ConfigStore {
                    path,
                    data,
                    unsaved: false,
                })
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.thresholds.is_empty()
    }

    /// Whether some in-memory change has not reached the file yet.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn get_threshold(&self, ticker: &str) -> Option<Decimal> {
        self.data.thresholds.get(ticker).copied()
    }

    /// Alert state of a ticker. Untracked tickers report `Armed`.
    pub fn get_alert_state(&self, ticker: &str) -> AlertState {
        AlertState::from_flag(self.data.alert_sent.get(ticker).copied())
    }

    /// Snapshot of every tracked ticker, in insertion order.
    pub fn list(&self) -> Vec<TickerStatus> {
        self.data
            .thresholds
            .iter()
            .map(|(ticker, limit)| TickerStatus {
                ticker: ticker.clone(),
                limit: *limit,
                state: self.get_alert_state(ticker.as_str()),
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Add or update a ticker's limit. The ticker is re-armed either way.
    pub fn set_threshold(&mut self, ticker: Ticker, limit: Decimal) -> Result<SetOutcome, StoreError> {
        let mut next = self.data.clone();
        let outcome = match next.thresholds.insert(ticker.clone(), limit) {
            Some(previous) => SetOutcome::Updated { previous },
            None => SetOutcome::Added,
        };
        next.alert_sent.insert(ticker.clone(), false);
        self.commit(next)?;

        info!(%ticker, %limit, ?outcome, "Threshold set");
        Ok(outcome)
    }

    /// Stop tracking a ticker. Returns `false` if it was not tracked.
    pub fn remove(&mut self, ticker: &str) -> Result<bool, StoreError> {
        if !self.data.thresholds.contains_key(ticker) {
            return Ok(false);
        }

        let mut next = self.data.clone();
        // shift_remove keeps the remaining tickers in insertion order.
        next.thresholds.shift_remove(ticker);
        next.alert_sent.shift_remove(ticker);
        self.commit(next)?;

        info!(ticker, "Ticker removed");
        Ok(true)
    }

    /// Re-arm every ticker.
    pub fn reset_all_alerts(&mut self) -> Result<(), StoreError> {
        if self.data.alert_sent.values().all(|sent| !sent) {
            debug!("All alerts already armed");
            return Ok(());
        }

        let mut next = self.data.clone();
        for sent in next.alert_sent.values_mut() {
            *sent = false;
        }
        self.commit(next)?;

        info!("All alerts re-armed");
        Ok(())
    }

    /// Record that the alert for `ticker` was delivered.
    ///
    /// Returns `false` without touching the file if the ticker is no longer
    /// tracked (it may have been removed while a notification was in flight).
    /// The ticker is FIRED in memory even if this returns a write error.
    pub fn mark_fired(&mut self, ticker: &str) -> Result<bool, StoreError> {
        let Some(key) = self.data.thresholds.get_key_value(ticker).map(|(k, _)| k.clone()) else {
            return Ok(false);
        };

        if !self.get_alert_state(ticker).is_fired() {
            self.data.alert_sent.insert(key, true);
            self.unsaved = true;
        }
        self.flush()?;
        Ok(true)
    }

    /// Execute a chat command against the store.
    pub fn apply(&mut self, command: Command) -> Result<Reply, StoreError> {
        match command {
            Command::List => Ok(Reply::Listing(self.list())),
            Command::SetThreshold { ticker, limit } => {
                let outcome = self.set_threshold(ticker.clone(), limit)?;
                Ok(Reply::threshold_set(ticker, limit, outcome))
            }
            Command::Remove { ticker } => {
                let existed = self.remove(ticker.as_str())?;
                Ok(Reply::Removed { ticker, existed })
            }
            Command::ResetAlerts => {
                self.reset_all_alerts()?;
                Ok(Reply::AlertsReset)
            }
            Command::Help => Ok(Reply::Help),
        }
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Persist `next` and make it the in-memory state.
    fn commit(&mut self, next: StoreData) -> Result<(), StoreError> {
        write_with_retry(&self.path, &next)?;
        self.data = next;
        self.unsaved = false;
        Ok(())
    }

    /// Write unsaved in-memory changes to disk. No-op when there are none.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.unsaved {
            return Ok(());
        }
        write_with_retry(&self.path, &self.data)?;
        self.unsaved = false;
        debug!("Unsaved store changes written");
        Ok(())
    }
}

/// One retry on failure.
fn write_with_retry(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    if let Err(first) = write_atomic(path, data) {
        warn!(error = %first, "Store write failed, retrying once");
        write_atomic(path, data)?;
    }
    Ok(())
}

/// Write the whole store to a sibling temp file, then rename it over `path`.
fn write_atomic(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let content = serde_json::to_string_pretty(data).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = File::create(&tmp_path).map_err(io_err)?;
    file.write_all(content.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(io_err)
}
