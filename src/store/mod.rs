//! Document stores and the one-time backend selection.

pub mod d1;
pub mod local;
pub mod remote;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

pub use d1::{D1Client, QueryError, QueryExecutor, Row};
pub use local::LocalStore;
pub use remote::RemoteStore;

/// Identifier attempts before giving up on a conflicting id
pub const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Local,
    Remote,
}

/// Write-once key to document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Persist `content` and return its new identifier
    async fn save(&self, content: &str, ip: Option<&str>) -> Result<String>;

    /// Content saved under `id`, if any
    async fn get(&self, id: &str) -> Result<Option<String>>;

    /// Whether `ip` may save another document. Never fails.
    async fn check_rate_limit(&self, ip: &str) -> bool;

    fn backend(&self) -> StoreBackend;
}

pub type SharedStore = Arc<dyn DocumentStore>;

/// Picks the backend once for the life of the process.
pub fn select_store(config: &Config) -> Result<SharedStore> {
    if let Some(credentials) = config.remote_credentials() {
        let client = D1Client::new(&config.api_base_url, &credentials)?;
        info!(endpoint = %client.endpoint(), "Using remote document store");
        return Ok(Arc::new(RemoteStore::new(client)));
    }

    if config.is_development() {
        let path = config.store_file();
        info!(path = %path.display(), "Using file-backed local document store");
        Ok(Arc::new(LocalStore::file(path)))
    } else {
        info!("Using in-memory local document store");
        Ok(Arc::new(LocalStore::memory()))
    }
}

/// Which store is active and which settings were seen. Values are never exposed.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub adapter: StoreBackend,
    pub env: StoreEnvStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreEnvStatus {
    pub has_account_id: bool,
    pub has_database_id: bool,
    pub has_api_token: bool,
    pub runtime_mode: String,
}

impl StoreStatus {
    pub fn new(adapter: StoreBackend, config: &Config) -> Self {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        Self {
            adapter,
            env: StoreEnvStatus {
                has_account_id: present(&config.account_id),
                has_database_id: present(&config.database_id),
                has_api_token: present(&config.api_token),
                runtime_mode: config.runtime_mode.clone(),
            },
        }
    }
}
