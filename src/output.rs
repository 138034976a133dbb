//! Input and output types of the conversion pipeline.

use crate::error::{ConversionError, FailureKind};
use crate::object_url::ObjectUrl;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A PDF payload together with the name it was uploaded under.
///
/// The name only drives the output file name; whether the bytes really are a
/// PDF is decided by the decoder.
#[derive(Debug, Clone)]
pub struct ConversionInput {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ConversionInput {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A named binary artifact, as handed to file storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFile {
    pub name: String,
    pub bytes: Bytes,
    pub mime_type: String,
}

impl NamedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A successfully converted first page.
#[derive(Debug)]
pub struct ConvertedImage {
    /// Revocable handle for immediate display.
    pub image_url: ObjectUrl,
    /// The PNG, named after the input (`resume.pdf` → `resume.png`).
    pub file: NamedFile,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

/// Serialisable summary of one conversion, success or failure.
///
/// Used for JSON reports; the bytes themselves are not included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Success {
        image_url: String,
        file_name: String,
        mime_type: String,
        width: u32,
        height: u32,
        size_bytes: usize,
    },
    Failure {
        kind: FailureKind,
        reason: String,
    },
}

impl ConversionOutcome {
    pub fn from_result(result: &Result<ConvertedImage, ConversionError>) -> Self {
        match result {
            Ok(image) => ConversionOutcome::Success {
                image_url: image.image_url.to_string(),
                file_name: image.file.name.clone(),
                mime_type: image.file.mime_type.clone(),
                width: image.width,
                height: image.height,
                size_bytes: image.file.len(),
            },
            Err(e) => ConversionOutcome::Failure {
                kind: e.kind(),
                reason: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success { .. })
    }
}
