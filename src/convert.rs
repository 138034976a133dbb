//! PDF → PNG preview conversion.
//!
//! [`PdfToImageConverter::convert`] is a strict sequential pipeline:
//!
//! ```text
//! env check ─▶ decode ─▶ page 1 ─▶ viewport ×4 ─▶ surface ─▶ render ─▶ PNG ─▶ name ─▶ URL
//! └──────────────────── spawn_blocking ─────────────────────────────┘
//! ```
//!
//! Each step fails with its own [`ConversionError`] variant and nothing is
//! produced on failure: no bytes, no file, no URL. The converter holds no
//! per-call state; every call opens its own engine session, document and
//! bitmap. The only shared resource is the [`ObjectUrlRegistry`] the minted
//! handles live in.

use crate::config::{ConverterConfig, PNG_MIME};
use crate::error::{ConversionError, ConvertPathError};
use crate::object_url::ObjectUrlRegistry;
use crate::output::{ConversionInput, ConvertedImage};
use crate::pipeline::render::{PdfiumBackend, RenderBackend};
use crate::pipeline::{encode, input, package, render};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Turns the first page of a PDF into a PNG preview.
#[derive(Clone)]
pub struct PdfToImageConverter {
    backend: Arc<dyn RenderBackend>,
    urls: ObjectUrlRegistry,
    config: ConverterConfig,
}

impl PdfToImageConverter {
    /// A converter rendering with pdfium.
    pub fn new(config: ConverterConfig) -> Self {
        let backend = Arc::new(PdfiumBackend::new(&config));
        Self::with_backend(backend, config)
    }

    /// A converter rendering with a caller-supplied backend.
    pub fn with_backend(backend: Arc<dyn RenderBackend>, config: ConverterConfig) -> Self {
        Self {
            backend,
            urls: ObjectUrlRegistry::new(),
            config,
        }
    }

    /// Mint URLs into `registry` instead of a private one.
    pub fn with_registry(mut self, registry: ObjectUrlRegistry) -> Self {
        self.urls = registry;
        self
    }

    /// The registry holding this converter's minted URLs.
    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.urls
    }

    /// Convert page 1 of `input` into a PNG file and an object URL.
    ///
    /// Never panics and never returns a partial result. The returned URL is
    /// not revoked by the converter; release it with
    /// [`crate::object_url::ObjectUrl::revoke`].
    pub async fn convert(&self, input: ConversionInput) -> Result<ConvertedImage, ConversionError> {
        let start = Instant::now();
        let ConversionInput { file_name, bytes } = input;
        info!("Converting '{}' ({} bytes)", file_name, bytes.len());

        let result = self.rasterise(bytes).await;
        let (png, width, height) = match result {
            Ok(v) => v,
            Err(e) => {
                warn!("PDF conversion error for '{}': {}", file_name, e);
                return Err(e);
            }
        };

        // ── Naming & packaging ───────────────────────────────────────────
        let file = package::package_png(&file_name, png);

        // ── URL minting ──────────────────────────────────────────────────
        let image_url = self.urls.mint(file.bytes.clone(), PNG_MIME);

        info!(
            "Converted '{}' → '{}' ({}x{} px, {} bytes) in {}ms",
            file_name,
            file.name,
            width,
            height,
            file.len(),
            start.elapsed().as_millis()
        );

        Ok(ConvertedImage {
            image_url,
            file,
            width,
            height,
        })
    }

    /// Read `path_or_url` and convert it.
    pub async fn convert_path(
        &self,
        path_or_url: &str,
        download_timeout_secs: u64,
    ) -> Result<ConvertedImage, ConvertPathError> {
        let input = input::load_input(path_or_url, download_timeout_secs).await?;
        Ok(self.convert(input).await?)
    }

    /// Steps 1–7 on the blocking pool. Returns the PNG and its dimensions.
    async fn rasterise(&self, bytes: Bytes) -> Result<(Vec<u8>, u32, u32), ConversionError> {
        let backend = Arc::clone(&self.backend);
        let password = self.config.password.clone();

        tokio::task::spawn_blocking(move || {
            let image = render::render_preview(backend.as_ref(), &bytes, password.as_deref())?;
            let png = encode::encode_png(&image)?;
            Ok::<_, ConversionError>((png, image.width(), image.height()))
        })
        .await
        .map_err(|e| ConversionError::Unknown(format!("render task panicked: {}", e)))?
    }
}

impl std::fmt::Debug for PdfToImageConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfToImageConverter")
            .field("backend", &self.backend.name())
            .field("urls", &self.urls)
            .field("config", &self.config)
            .finish()
    }
}
