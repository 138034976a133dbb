//! External collaborators of the analysis workflow.
//!
//! The workflow only needs three narrow capabilities, each behind a trait so
//! the backend can be swapped without touching the caller:
//!
//! | Trait | Operations | Implementations |
//! |-------|------------|-----------------|
//! | [`FileStorage`] | `upload`, `read` | [`MemoryStorage`], [`LocalFileStorage`] |
//! | [`KeyValueStore`] | `get`, `set` | [`MemoryKvStore`], [`JsonFileKvStore`] |
//! | [`FeedbackService`] | `feedback` | [`LlmFeedbackService`] |
//!
//! The workflow holds each as `Arc<dyn Trait>`.

pub mod ai;
pub mod kv;
pub mod storage;

pub use ai::{resolve_provider, LlmFeedbackService};
pub use kv::{JsonFileKvStore, MemoryKvStore};
pub use storage::{LocalFileStorage, MemoryStorage};

use crate::error::ServiceError;
use crate::feedback::FeedbackResponse;
use crate::output::NamedFile;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub path: String,
    pub name: String,
    pub size: usize,
}

/// Persistent file storage.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store every file in `files` and return the location of the last one.
    ///
    /// An empty batch is [`ServiceError::EmptyResult`].
    async fn upload(&self, files: Vec<NamedFile>) -> Result<StoredFile, ServiceError>;

    /// Read back a file previously returned by `upload`.
    async fn read(&self, path: &str) -> Result<Bytes, ServiceError>;
}

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError>;
}

/// AI review of a stored document.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<FeedbackResponse, ServiceError>;
}
