//! File storage backends.

use super::{FileStorage, StoredFile};
use crate::error::ServiceError;
use crate::output::NamedFile;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Keep only the final path component of an uploaded name.
fn sanitise_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload.bin".to_string())
}

/// Storage-relative location for a new upload: `uploads/<uuid>/<name>`.
fn upload_path(name: &str) -> String {
    format!("uploads/{}/{}", Uuid::new_v4(), sanitise_name(name))
}

// ── In-memory ────────────────────────────────────────────────────────────

/// Process-local storage for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, NamedFile>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored file whose MIME type equals `mime_type`.
    pub fn files_of_type(&self, mime_type: &str) -> Vec<NamedFile> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|f| f.mime_type == mime_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FileStorage for MemoryStorage {
    async fn upload(&self, files: Vec<NamedFile>) -> Result<StoredFile, ServiceError> {
        let mut stored = None;
        let mut map = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        for file in files {
            let path = upload_path(&file.name);
            stored = Some(StoredFile {
                path: path.clone(),
                name: file.name.clone(),
                size: file.len(),
            });
            map.insert(path, file);
        }
        stored.ok_or(ServiceError::EmptyResult { service: "file storage" })
    }

    async fn read(&self, path: &str) -> Result<Bytes, ServiceError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| ServiceError::NotFound {
                path: path.to_string(),
            })
    }
}

// ── Local directory ──────────────────────────────────────────────────────

/// Stores uploads under a root directory. Returned paths are relative to
/// the root.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a storage-relative `path`. Rejects absolute
    /// paths and `..` so reads cannot escape the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let rel = Path::new(path);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || !safe {
            return None;
        }
        Some(self.root.join(rel))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, files: Vec<NamedFile>) -> Result<StoredFile, ServiceError> {
        let mut stored = None;
        for file in files {
            let rel = upload_path(&file.name);
            let abs = self.root.join(&rel);
            if let Some(parent) = abs.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ServiceError::Io {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
            }
            tokio::fs::write(&abs, &file.bytes)
                .await
                .map_err(|e| ServiceError::Io {
                    path: abs.clone(),
                    source: e,
                })?;
            debug!("Stored '{}' at {}", file.name, abs.display());
            stored = Some(StoredFile {
                path: rel,
                name: file.name,
                size: file.bytes.len(),
            });
        }
        stored.ok_or(ServiceError::EmptyResult { service: "file storage" })
    }

    async fn read(&self, path: &str) -> Result<Bytes, ServiceError> {
        let abs = self.resolve(path).ok_or_else(|| ServiceError::NotFound {
            path: path.to_string(),
        })?;
        match tokio::fs::read(&abs).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServiceError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(ServiceError::Io { path: abs, source: e }),
        }
    }
}
