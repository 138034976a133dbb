//! Process-local object URLs for converted images.
//!
//! A converted preview is displayed through a `blob:resumind/<uuid>` string
//! that resolves to bytes held in memory by an [`ObjectUrlRegistry`]. The
//! bytes stay alive until the handle is revoked. Nothing here revokes on its
//! own: a dropped [`ObjectUrl`] keeps its entry, so long-lived sessions must
//! call [`ObjectUrl::revoke`] (or [`ObjectUrlRegistry::revoke`]) when the
//! preview is no longer shown.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Scheme and authority prefix of every minted URL.
pub const OBJECT_URL_PREFIX: &str = "blob:resumind/";

/// Bytes referenced by an object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// Shared store behind minted URLs. Cloning shares the same store.
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    entries: Arc<Mutex<HashMap<Uuid, Blob>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return a fresh handle. Minting the same bytes
    /// twice yields two independent handles.
    pub fn mint(&self, bytes: Bytes, mime_type: impl Into<String>) -> ObjectUrl {
        let id = Uuid::new_v4();
        let blob = Blob {
            bytes,
            mime_type: mime_type.into(),
        };
        debug!("Minted object URL {}{} ({} bytes)", OBJECT_URL_PREFIX, id, blob.bytes.len());
        self.lock().insert(id, blob);
        ObjectUrl {
            id,
            url: format!("{OBJECT_URL_PREFIX}{id}"),
            registry: self.clone(),
        }
    }

    /// Look up the blob behind `url`, if it has not been revoked.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        let id = parse_url(url)?;
        self.lock().get(&id).cloned()
    }

    /// Release the blob behind `url`. Returns `false` if the URL is unknown
    /// or was already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        match parse_url(url) {
            Some(id) => self.revoke_id(id),
            None => false,
        }
    }

    /// Number of handles that are still live.
    pub fn live_handles(&self) -> usize {
        self.lock().len()
    }

    fn revoke_id(&self, id: Uuid) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!("Revoked object URL {}{}", OBJECT_URL_PREFIX, id);
        }
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Blob>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ObjectUrlRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrlRegistry")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

fn parse_url(url: &str) -> Option<Uuid> {
    url.strip_prefix(OBJECT_URL_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// A revocable handle to an in-memory image.
///
/// Not `Clone`: revoking consumes the handle, so the type system guarantees
/// each handle is revoked at most once.
#[must_use = "an object URL keeps its bytes alive until revoked"]
pub struct ObjectUrl {
    id: Uuid,
    url: String,
    registry: ObjectUrlRegistry,
}

impl ObjectUrl {
    /// The `blob:resumind/<uuid>` string.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Fetch the referenced bytes.
    pub fn resolve(&self) -> Option<Blob> {
        self.registry.resolve(&self.url)
    }

    /// Release the referenced bytes. Returns `false` if the same URL was
    /// already revoked through the registry.
    pub fn revoke(self) -> bool {
        self.registry.revoke_id(self.id)
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}
