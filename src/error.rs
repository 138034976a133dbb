//! Error types for the resumind library.
//!
//! Three error types reflect three distinct boundaries:
//!
//! * [`ConversionError`]: the closed set of reasons the PDF → PNG converter
//!   can fail. Every failure inside the pipeline is mapped to one of these
//!   five variants before it leaves [`crate::convert::PdfToImageConverter`];
//!   callers can match exhaustively instead of parsing message strings.
//!
//! * [`ServiceError`]: a collaborator (file storage, key-value store, AI
//!   inference) failed. These come from I/O and network code we don't own.
//!
//! * [`WorkflowError`]: the upload-and-analyse flow aborted at a given step.
//!   Wraps the two types above with the step that failed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Why a PDF could not be turned into a preview image.
///
/// The `Display` output is the human-readable reason reported to callers.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionError {
    /// No rendering engine could be bound in this process (headless host,
    /// missing pdfium library). Raised before any decode work.
    #[error("Cannot run PDF conversion: no rendering engine available ({detail})")]
    EnvironmentUnsupported { detail: String },

    /// The payload is not a parseable PDF document, or it has no pages.
    #[error("Failed to convert PDF: {detail}")]
    DecodeFailure { detail: String },

    /// The host could not provide a drawing surface of the requested size.
    #[error("Canvas context not available: cannot allocate a {width}x{height} px surface ({detail})")]
    RenderSurfaceUnavailable {
        width: u32,
        height: u32,
        detail: String,
    },

    /// Raster → PNG encoding failed or produced no bytes.
    #[error("Failed to create image data: {detail}")]
    EncodeFailure { detail: String },

    /// Anything else, wrapped with its original message.
    #[error("Failed to convert PDF: {0}")]
    Unknown(String),
}

impl ConversionError {
    /// Stable machine-readable tag for this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            ConversionError::EnvironmentUnsupported { .. } => FailureKind::EnvironmentUnsupported,
            ConversionError::DecodeFailure { .. } => FailureKind::DecodeFailure,
            ConversionError::RenderSurfaceUnavailable { .. } => {
                FailureKind::RenderSurfaceUnavailable
            }
            ConversionError::EncodeFailure { .. } => FailureKind::EncodeFailure,
            ConversionError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

/// Discriminant of [`ConversionError`], serialised in JSON reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    EnvironmentUnsupported,
    DecodeFailure,
    RenderSurfaceUnavailable,
    EncodeFailure,
    Unknown,
}

/// Errors resolving a user-supplied path or URL into a conversion input.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither an existing path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },
}

/// Either the input could not be read, or it could not be converted.
#[derive(Debug, Error)]
pub enum ConvertPathError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// A collaborator service failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Local storage could not be read or written.
    #[error("Storage I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing is stored under the requested path.
    #[error("File not found in storage: '{path}'")]
    NotFound { path: String },

    /// The service answered but returned nothing usable.
    #[error("{service} returned an empty result")]
    EmptyResult { service: &'static str },

    /// The stored document cannot be sent to a vision model.
    #[error("Unsupported document type for '{path}': expected a PNG or JPEG image")]
    UnsupportedDocument { path: String },

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call did not finish in time.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// A stored value could not be (de)serialised.
    #[error("Serialisation error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The résumé analysis flow aborted.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Resume upload failed: {0}")]
    ResumeUploadFailed(#[source] ServiceError),

    #[error("PDF conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),

    #[error("Image upload failed: {0}")]
    ImageUploadFailed(#[source] ServiceError),

    #[error("Failed to store record '{key}': {source}")]
    RecordWriteFailed {
        key: String,
        #[source]
        source: ServiceError,
    },

    #[error("AI analysis failed: {0}")]
    AnalysisFailed(#[source] ServiceError),

    #[error("AI returned invalid JSON: {detail}")]
    InvalidAiJson { detail: String },

    #[error("Resume record '{id}' not found")]
    RecordNotFound { id: String },

    #[error("Failed to read record '{key}': {source}")]
    RecordReadFailed {
        key: String,
        #[source]
        source: ServiceError,
    },
}

/// Builder validation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);
