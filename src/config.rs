use envconfig::Envconfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime mode that selects the file-backed local store.
pub const DEVELOPMENT_MODE: &str = "development";

/// Name of the local store file inside the data directory.
pub const STORE_FILE: &str = "store.json";

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Remote database account identifier
    #[envconfig(from = "ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Remote database identifier
    #[envconfig(from = "DATABASE_ID")]
    pub database_id: Option<String>,

    /// Bearer token for the remote query endpoint
    #[envconfig(from = "API_TOKEN")]
    pub api_token: Option<String>,

    /// "development" keeps documents in a JSON file, anything else in memory
    #[envconfig(from = "RUNTIME_MODE", default = "production")]
    pub runtime_mode: String,

    /// Directory holding the local store file
    #[envconfig(from = "DATA_DIR", default = ".data")]
    pub data_dir: PathBuf,

    /// Base URL of the remote query API
    #[envconfig(from = "D1_API_BASE", default = "https://api.cloudflare.com/client/v4")]
    pub api_base_url: String,

    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,
}

/// Credentials for the remote store. Only built when all three are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub account_id: String,
    pub database_id: String,
    pub api_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    pub fn remote_credentials(&self) -> Option<RemoteCredentials> {
        Some(RemoteCredentials {
            account_id: non_blank(&self.account_id)?,
            database_id: non_blank(&self.database_id)?,
            api_token: non_blank(&self.api_token)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.runtime_mode.eq_ignore_ascii_case(DEVELOPMENT_MODE)
    }

    /// Path of the JSON file used by the file-backed local store
    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            account_id: None,
            database_id: None,
            api_token: None,
            runtime_mode: "production".to_string(),
            data_dir: PathBuf::from(".data"),
            api_base_url: "https://api.cloudflare.com/client/v4".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials(account: &str, database: &str, token: &str) -> Config {
        Config {
            account_id: Some(account.to_string()),
            database_id: Some(database.to_string()),
            api_token: Some(token.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_remote_credentials_require_all_three() {
        let config = with_credentials("acct", "db", "token");
        let creds = config.remote_credentials().unwrap();
        assert_eq!(creds.account_id, "acct");
        assert_eq!(creds.database_id, "db");
        assert_eq!(creds.api_token, "token");

        let mut missing = config.clone();
        missing.api_token = None;
        assert!(missing.remote_credentials().is_none());
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let config = with_credentials("acct", "   ", "token");
        assert!(config.remote_credentials().is_none());
    }

    #[test]
    fn test_development_mode() {
        let mut config = Config::default();
        assert!(!config.is_development());

        config.runtime_mode = "Development".to_string();
        assert!(config.is_development());
        assert_eq!(config.store_file(), PathBuf::from(".data/store.json"));
    }
}
