//! Remote document store on top of a SQL query endpoint.
//!
//! The table is created lazily on the first write and the `ip_address`
//! column is added on demand when an older table lacks it.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::d1::{D1Client, QueryError, QueryExecutor, Row};
use super::{DocumentStore, StoreBackend, MAX_ID_ATTEMPTS};
use crate::document::{now_millis, UNKNOWN_IP};
use crate::error::{ReadexError, Result};
use crate::id_generator::generate_id;
use crate::rate_limit::RateLimitPolicy;

pub const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS readmes (id TEXT PRIMARY KEY, content TEXT, created_at INTEGER, ip_address TEXT)";
pub const ADD_IP_COLUMN_SQL: &str = "ALTER TABLE readmes ADD COLUMN ip_address TEXT";
pub const INSERT_SQL: &str =
    "INSERT INTO readmes (id, content, created_at, ip_address) VALUES (?, ?, ?, ?)";
pub const SELECT_SQL: &str = "SELECT content FROM readmes WHERE id = ? LIMIT 1";
pub const COUNT_RECENT_SQL: &str =
    "SELECT COUNT(*) AS count FROM readmes WHERE ip_address = ? AND created_at > ?";

pub struct RemoteStore<Q = D1Client> {
    executor: Q,
    policy: RateLimitPolicy,
}

impl<Q: QueryExecutor> RemoteStore<Q> {
    pub fn new(executor: Q) -> Self {
        Self {
            executor,
            policy: RateLimitPolicy::default(),
        }
    }

    pub fn executor(&self) -> &Q {
        &self.executor
    }

    async fn ensure_table(&self) -> std::result::Result<(), QueryError> {
        self.executor.query(CREATE_TABLE_SQL, Vec::new()).await?;
        Ok(())
    }

    async fn add_ip_column(&self) -> std::result::Result<(), QueryError> {
        info!("Adding missing ip_address column to readmes");
        self.executor.query(ADD_IP_COLUMN_SQL, Vec::new()).await?;
        Ok(())
    }

    /// Runs `sql`, migrating the table once if it predates `ip_address`.
    async fn query_migrating(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> std::result::Result<Vec<Row>, QueryError> {
        match self.executor.query(sql, params.clone()).await {
            Err(e) if e.is_missing_column() => {
                self.add_ip_column().await?;
                self.executor.query(sql, params).await
            }
            other => other,
        }
    }

    async fn count_recent(&self, ip: &str) -> std::result::Result<u64, QueryError> {
        self.ensure_table().await?;
        let since = self.policy.window_start(now_millis());
        let rows = self
            .query_migrating(COUNT_RECENT_SQL, vec![Value::from(ip), Value::from(since)])
            .await?;
        Ok(rows.first().and_then(row_count).unwrap_or(0))
    }
}

/// Reads the `count` column, which may arrive as a number or a string
fn row_count(row: &Row) -> Option<u64> {
    match row.get("count")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl<Q: QueryExecutor> DocumentStore for RemoteStore<Q> {
    async fn save(&self, content: &str, ip: Option<&str>) -> Result<String> {
        self.ensure_table().await?;
        let ip = ip.unwrap_or(UNKNOWN_IP);

        let mut attempt = 1;
        loop {
            let id = generate_id();
            let params = vec![
                Value::from(id.as_str()),
                Value::from(content),
                Value::from(now_millis()),
                Value::from(ip),
            ];
            match self.query_migrating(INSERT_SQL, params).await {
                Ok(_) => {
                    debug!(id = %id, "Saved document to remote store");
                    return Ok(id);
                }
                Err(e) if e.is_duplicate_key() && attempt < MAX_ID_ATTEMPTS => {
                    warn!(id = %id, attempt, "Identifier collision, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(ReadexError::Query(e)),
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<String>> {
        match self.executor.query(SELECT_SQL, vec![Value::from(id)]).await {
            Ok(rows) => Ok(rows
                .into_iter()
                .next()
                .and_then(|mut row| match row.remove("content") {
                    Some(Value::String(content)) => Some(content),
                    _ => None,
                })),
            // Nothing has been saved on this database yet
            Err(e) if e.is_missing_table() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn check_rate_limit(&self, ip: &str) -> bool {
        match self.count_recent(ip).await {
            Ok(count) => {
                let allowed = self.policy.allows(count);
                if !allowed {
                    info!(ip = %ip, count, "Share rate limit reached");
                }
                allowed
            }
            Err(e) => {
                warn!(ip = %ip, error = %e, "Rate limit check failed, allowing write");
                true
            }
        }
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Remote
    }
}
