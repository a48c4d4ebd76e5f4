//! Stored document shapes.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Address recorded when the client address cannot be determined
pub const UNKNOWN_IP: &str = "unknown";

/// A saved markdown document as persisted by the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub content: String,
    pub ip: String,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
}

impl DocumentRecord {
    pub fn new(content: &str, ip: Option<&str>) -> Self {
        Self {
            content: content.to_string(),
            ip: ip.unwrap_or(UNKNOWN_IP).to_string(),
            created_at: now_millis(),
        }
    }
}

/// A value read back from the local store file.
///
/// Older files map ids straight to the markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Legacy(String),
    Record(DocumentRecord),
}

impl StoredEntry {
    pub fn into_content(self) -> String {
        match self {
            StoredEntry::Legacy(content) => content,
            StoredEntry::Record(record) => record.content,
        }
    }
}

impl From<DocumentRecord> for StoredEntry {
    fn from(record: DocumentRecord) -> Self {
        StoredEntry::Record(record)
    }
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
