//! # resumind
//!
//! Turn the first page of a résumé PDF into a PNG preview and get AI feedback
//! on it.
//!
//! ## Why this crate?
//!
//! Vision models read a rendered page far more reliably than text scraped out
//! of a PDF: columns, icons and typographic hierarchy survive. The converter
//! rasterises page 1 at 4× scale with pdfium, which keeps small print legible
//! for both the model and a human looking at the preview.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Render   bind pdfium, decode, page 1 at 4× (spawn_blocking)
//!  ├─ 3. Encode   raster → PNG
//!  ├─ 4. Package  resume.pdf → resume.png, image/png
//!  ├─ 5. URL      revocable blob:resumind/<uuid> handle
//!  └─ 6. Review   (optional) upload, store record, vision-model feedback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumind::{ConversionInput, ConverterConfig, PdfToImageConverter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = PdfToImageConverter::new(ConverterConfig::default());
//!     let bytes = std::fs::read("resume.pdf")?;
//!     let image = converter.convert(ConversionInput::new("resume.pdf", bytes)).await?;
//!     println!("{} ({}x{})", image.file.name, image.width, image.height);
//!     image.image_url.revoke();
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resumind` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resumind = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod feedback;
pub mod object_url;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod services;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ConverterConfig, ConverterConfigBuilder, PNG_MIME,
    RENDER_SCALE,
};
pub use convert::PdfToImageConverter;
pub use error::{
    ConfigError, ConversionError, ConvertPathError, FailureKind, InputError, ServiceError,
    WorkflowError,
};
pub use feedback::FeedbackResponse;
pub use object_url::{ObjectUrl, ObjectUrlRegistry};
pub use output::{ConversionInput, ConversionOutcome, ConvertedImage, NamedFile};
pub use progress::{AnalysisProgressCallback, AnalysisStage, NoopProgressCallback};
pub use services::{FeedbackService, FileStorage, KeyValueStore, StoredFile};
pub use workflow::{AnalyzeRequest, ResumeAnalyzer, ResumeRecord};
