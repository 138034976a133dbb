//! Key-value store backends.

use super::KeyValueStore;
use crate::error::ServiceError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys beginning with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A store persisted as one JSON object on disk.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename, so readers never see a half-written file. Writes within one
/// process are serialised by an async mutex.
#[derive(Debug)]
pub struct JsonFileKvStore {
    path: PathBuf,
    lock: AsyncMutex<()>,
}

impl JsonFileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> ServiceError {
        ServiceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let serialised = serde_json::to_vec_pretty(&entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialised)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("kv set '{}' ({} entries)", key, entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_get_set() {
        let kv = MemoryKvStore::new();
        assert_eq!(kv.get("resume:1").await.unwrap(), None);
        kv.set("resume:1", "{}").await.unwrap();
        kv.set("resume:1", "{\"a\":1}").await.unwrap();
        kv.set("other", "x").await.unwrap();
        assert_eq!(kv.get("resume:1").await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(kv.keys_with_prefix("resume:"), vec!["resume:1".to_string()]);
    }

    #[tokio::test]
    async fn json_file_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("kv.json");

        let kv = JsonFileKvStore::new(&path);
        assert_eq!(kv.get("missing").await.unwrap(), None);
        kv.set("resume:abc", "{\"id\":\"abc\"}").await.unwrap();
        kv.set("resume:def", "{}").await.unwrap();

        let reopened = JsonFileKvStore::new(&path);
        assert_eq!(
            reopened.get("resume:abc").await.unwrap().as_deref(),
            Some("{\"id\":\"abc\"}")
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serde_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = JsonFileKvStore::new(&path).get("k").await.unwrap_err();
        assert!(matches!(err, ServiceError::Serde(_)));
    }
}
