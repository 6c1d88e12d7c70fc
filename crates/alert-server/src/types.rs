//! Shared types for the alert server.
//!
//! This module defines:
//! - `SharedStore`: the config store handle shared by the monitor task
//!   and the webhook handlers
//! - `AppState`: what every HTTP handler can reach
//! - `mutate_store`: runs a store mutation (and its file write) off the
//!   async worker threads

use std::sync::Arc;

use alert_core::ConfigStore;
use tokio::sync::RwLock;
use tokio::task::JoinError;

use crate::config::Secret;
use crate::notifier::Notifier;

/// The one config store of the process.
///
/// All mutations go through `ConfigStore`'s operations; the lock is never
/// held across a network call.
pub type SharedStore = Arc<RwLock<ConfigStore>>;

pub fn shared_store(store: ConfigStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// Run `f` against the store on the blocking pool.
///
/// Store mutations write the backing file synchronously; the write lock
/// is held for the whole call, so mutations stay serialised. Only fails
/// if `f` panicked.
pub async fn mutate_store<F, R>(store: &SharedStore, f: F) -> Result<R, JoinError>
where
    F: FnOnce(&mut ConfigStore) -> R + Send + 'static,
    R: Send + 'static,
{
    let mut guard = store.clone().write_owned().await;
    tokio::task::spawn_blocking(move || f(&mut *guard)).await
}

/// State handed to the axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub notifier: Arc<dyn Notifier>,
    pub webhook_secret: Option<Secret>,
}
