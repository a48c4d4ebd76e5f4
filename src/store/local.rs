//! Local document store: a JSON file in development, a process map otherwise.
//!
//! Storage failures are logged and absorbed. Reads fall back to an empty
//! mapping and failed writes lose the document instead of failing the caller.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::{DocumentStore, StoreBackend, MAX_ID_ATTEMPTS};
use crate::document::{DocumentRecord, StoredEntry};
use crate::error::Result;
use crate::id_generator::generate_id;

type Entries = BTreeMap<String, StoredEntry>;

enum Backing {
    File {
        path: PathBuf,
        /// Serialises read-modify-write cycles within this process
        write_lock: Mutex<()>,
    },
    Memory(RwLock<HashMap<String, DocumentRecord>>),
}

pub struct LocalStore {
    backing: Backing,
}

impl LocalStore {
    /// Store backed by a single JSON file at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File {
                path: path.into(),
                write_lock: Mutex::new(()),
            },
        }
    }

    /// Store that lives only as long as the process
    pub fn memory() -> Self {
        Self {
            backing: Backing::Memory(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn save(&self, content: &str, ip: Option<&str>) -> Result<String> {
        let record = DocumentRecord::new(content, ip);

        match &self.backing {
            Backing::File { path, write_lock } => {
                let _guard = write_lock.lock().await;
                let mut entries = read_entries(path).await;
                let id = fresh_id(|candidate| entries.contains_key(candidate));
                entries.insert(id.clone(), record.into());
                write_entries(path, &entries).await;
                debug!(id = %id, "Saved document to local file");
                Ok(id)
            }
            Backing::Memory(map) => {
                let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
                let id = fresh_id(|candidate| map.contains_key(candidate));
                map.insert(id.clone(), record);
                warn!(
                    id = %id,
                    "Using in-memory store. Data will be lost on restart. Configure the remote database for persistence."
                );
                Ok(id)
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<String>> {
        match &self.backing {
            Backing::File { path, .. } => {
                let mut entries = read_entries(path).await;
                Ok(entries.remove(id).map(StoredEntry::into_content))
            }
            Backing::Memory(map) => {
                let map = map.read().unwrap_or_else(PoisonError::into_inner);
                Ok(map.get(id).map(|record| record.content.clone()))
            }
        }
    }

    async fn check_rate_limit(&self, _ip: &str) -> bool {
        true
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Local
    }
}

/// A new id not already taken, giving up after a few tries
fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    let mut id = generate_id();
    for _ in 1..MAX_ID_ATTEMPTS {
        if !taken(&id) {
            break;
        }
        id = generate_id();
    }
    id
}

/// Creates the data directory and an empty `{}` file if absent
async fn ensure_store_file(path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    // create_new never truncates a file another task just wrote
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(mut file) => {
            file.write_all(b"{}").await?;
            file.flush().await
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

async fn read_entries(path: &Path) -> Entries {
    match try_read_entries(path).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Local store read failed");
            Entries::new()
        }
    }
}

async fn try_read_entries(path: &Path) -> io::Result<Entries> {
    ensure_store_file(path).await?;
    let raw = fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(io::Error::from)
}

async fn write_entries(path: &Path, entries: &Entries) {
    if let Err(e) = try_write_entries(path, entries).await {
        error!(path = %path.display(), error = %e, "Local store write failed");
    }
}

async fn try_write_entries(path: &Path, entries: &Entries) -> io::Result<()> {
    ensure_store_file(path).await?;
    let json = serde_json::to_string_pretty(entries).map_err(io::Error::from)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn file_store(dir: &TempDir) -> (LocalStore, PathBuf) {
        let path = dir.path().join("data").join("store.json");
        (LocalStore::file(&path), path)
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = LocalStore::memory();
        let content = "# Title\n\nSome *markdown* with unicode: ünïcødé 🚀\n";
        let id = store.save(content, Some("10.0.0.1")).await.unwrap();

        assert_eq!(id.len(), 10);
        assert_eq!(store.get(&id).await.unwrap().as_deref(), Some(content));
        assert_eq!(store.get("missing000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_round_trip_creates_file() {
        let dir = TempDir::new().unwrap();
        let (store, path) = file_store(&dir);
        assert!(!path.exists());

        let id = store.save("  leading and trailing  ", None).await.unwrap();
        assert!(path.exists());
        assert_eq!(
            store.get(&id).await.unwrap().as_deref(),
            Some("  leading and trailing  ")
        );

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[&id]["ip"], "unknown");
        assert!(json[&id]["createdAt"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_get_on_fresh_store_initialises_empty_file() {
        let dir = TempDir::new().unwrap();
        let (store, path) = file_store(&dir);

        assert_eq!(store.get("abcdefghij").await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_ensure_store_file_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let (_, path) = file_store(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"kept000001": "still here"}"#).unwrap();

        ensure_store_file(&path).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"kept000001": "still here"}"#
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cold_store_reads_do_not_clobber_saves() {
        for _ in 0..20 {
            let dir = TempDir::new().unwrap();
            let (store, _) = file_store(&dir);
            let store = Arc::new(store);

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move { store.get("abcdefghij").await.unwrap() })
                })
                .collect();
            let writer = {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.save("first document", None).await.unwrap() })
            };

            let id = writer.await.unwrap();
            for reader in readers {
                assert_eq!(reader.await.unwrap(), None);
            }
            assert_eq!(
                store.get(&id).await.unwrap().as_deref(),
                Some("first document")
            );
        }
    }

    #[tokio::test]
    async fn test_reads_legacy_entries() {
        let dir = TempDir::new().unwrap();
        let (store, path) = file_store(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"legacy0001": "plain body", "record0001": {"content": "record body", "ip": "1.2.3.4", "createdAt": 1}}"#,
        )
        .unwrap();

        assert_eq!(
            store.get("legacy0001").await.unwrap().as_deref(),
            Some("plain body")
        );
        assert_eq!(
            store.get("record0001").await.unwrap().as_deref(),
            Some("record body")
        );

        // Saving keeps legacy entries readable
        let id = store.save("new body", Some("5.6.7.8")).await.unwrap();
        assert_eq!(
            store.get("legacy0001").await.unwrap().as_deref(),
            Some("plain body")
        );
        assert_eq!(store.get(&id).await.unwrap().as_deref(), Some("new body"));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let (store, path) = file_store(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json at all").unwrap();

        assert_eq!(store.get("anything00").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unwritable_location_does_not_fail_save() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file where a directory should be").unwrap();
        let store = LocalStore::file(blocker.join("store.json"));

        let id = store.save("lost", None).await.unwrap();
        assert_eq!(id.len(), 10);
        assert_eq!(store.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_file_saves_are_all_kept() {
        let dir = TempDir::new().unwrap();
        let (store, _) = file_store(&dir);
        let store = Arc::new(store);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let content = format!("document {}", i);
                    let id = store.save(&content, None).await.unwrap();
                    (id, content)
                })
            })
            .collect();

        for handle in handles {
            let (id, content) = handle.await.unwrap();
            assert_eq!(store.get(&id).await.unwrap(), Some(content));
        }
    }

    #[tokio::test]
    async fn test_local_never_rate_limits() {
        let store = LocalStore::memory();
        for _ in 0..50 {
            store.save("x", Some("9.9.9.9")).await.unwrap();
        }
        assert!(store.check_rate_limit("9.9.9.9").await);
        assert_eq!(store.backend(), StoreBackend::Local);
    }

    #[test]
    fn test_fresh_id_avoids_taken() {
        let id = fresh_id(|_| false);
        assert_eq!(id.len(), 10);

        let first = generate_id();
        let id = fresh_id(|candidate| candidate == first);
        assert_ne!(id, first);
    }
}
