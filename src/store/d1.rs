//! HTTP client for the remote SQL query endpoint.
//!
//! Every statement is one `POST {sql, params}` with bearer auth. The
//! response envelope is `{success, result: [{results: [...]}], errors}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::RemoteCredentials;
use crate::error::ReadexError;

/// One result row, keyed by column name
pub type Row = Map<String, Value>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("D1 request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("D1 API error: {status} {body}")]
    Status { status: u16, body: String },

    #[error("D1 query failed: {0}")]
    Rejected(String),
}

impl QueryError {
    fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_missing_table(&self) -> bool {
        self.message().contains("no such table")
    }

    pub fn is_missing_column(&self) -> bool {
        let message = self.message();
        message.contains("no such column") || message.contains("has no column named")
    }

    pub fn is_duplicate_key(&self) -> bool {
        self.message().contains("UNIQUE constraint failed")
    }
}

/// Executes a single parameterised statement against the remote database.
#[async_trait]
pub trait QueryExecutor: Send + Sync + 'static {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, QueryError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    sql: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    success: bool,
    #[serde(default)]
    result: Vec<QueryResult>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    results: Vec<Row>,
}

pub struct D1Client {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl D1Client {
    pub fn new(api_base_url: &str, credentials: &RemoteCredentials) -> Result<Self, ReadexError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReadexError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: query_endpoint(api_base_url, credentials),
            api_token: credentials.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `<base>/accounts/<account>/d1/database/<database>/query`
pub fn query_endpoint(api_base_url: &str, credentials: &RemoteCredentials) -> String {
    format!(
        "{}/accounts/{}/d1/database/{}/query",
        api_base_url.trim_end_matches('/'),
        credentials.account_id,
        credentials.database_id
    )
}

#[async_trait]
impl QueryExecutor for D1Client {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, QueryError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&QueryRequest { sql, params })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: QueryEnvelope = response.json().await?;
        if !envelope.success {
            let errors = serde_json::to_string(&envelope.errors).unwrap_or_default();
            return Err(QueryError::Rejected(errors));
        }

        Ok(envelope
            .result
            .into_iter()
            .next()
            .map(|r| r.results)
            .unwrap_or_default())
    }
}
