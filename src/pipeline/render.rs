//! Page rasterisation: render the preview page onto a bitmap surface.
//!
//! The converter never talks to pdfium directly. It goes through three small
//! traits that mirror the steps of a render:
//!
//! ```text
//! RenderBackend ──open_session──▶ RenderSession ──load──▶ LoadedDocument
//!  (env check)                     (decode)               (page size, surface, draw)
//! ```
//!
//! [`PdfiumBackend`] is the production implementation. Tests provide their own
//! backends to simulate hosts without a rendering engine, hosts that cannot
//! allocate a surface, and decoders that reject the payload.
//!
//! Everything here is blocking. pdfium uses thread-local state and is not
//! async-safe, so the converter runs [`render_preview`] inside
//! `tokio::task::spawn_blocking`.
//!
//! pdfium's library init and teardown are process-global and must not race,
//! so the library is bound once and kept until exit. Each conversion owns
//! only its document and bitmap.

use crate::config::{ConverterConfig, PREVIEW_PAGE, RENDER_SCALE};
use crate::error::ConversionError;
use image::DynamicImage;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Intrinsic page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Target raster size in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Scale a page's intrinsic size. Fractional pixels are truncated, the
    /// same way a canvas truncates a fractional width assignment.
    pub fn for_page(size: PageSize, scale: f32) -> Self {
        let px = |pt: f32| {
            let v = (pt * scale).floor();
            if v.is_finite() && v > 0.0 {
                v.min(u32::MAX as f32) as u32
            } else {
                0
            }
        };
        Self {
            width: px(size.width_pt),
            height: px(size.height_pt),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rendering engine that may or may not be usable in this process.
pub trait RenderBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Acquire a session with the engine. Fails with
    /// [`ConversionError::EnvironmentUnsupported`] when the host lacks it.
    fn open_session(&self) -> Result<Box<dyn RenderSession>, ConversionError>;
}

/// A bound engine, able to decode documents.
pub trait RenderSession {
    /// Parse `bytes` as a PDF. Fails with [`ConversionError::DecodeFailure`].
    fn load<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Box<dyn LoadedDocument + 'a>, ConversionError>;
}

/// A decoded document.
pub trait LoadedDocument {
    fn page_count(&self) -> usize;

    /// Intrinsic size of the page at 0-based `index`.
    fn page_size(&self, index: usize) -> Result<PageSize, ConversionError>;

    /// Allocate a surface of exactly `viewport` and draw the page into it.
    ///
    /// Returns only once drawing has completed. A surface that cannot be
    /// allocated is [`ConversionError::RenderSurfaceUnavailable`].
    fn render_page(&self, index: usize, viewport: Viewport) -> Result<DynamicImage, ConversionError>;
}

/// Run steps 1–6 of a conversion: environment check, decode, page
/// acquisition, viewport sizing, surface acquisition and render.
pub fn render_preview(
    backend: &dyn RenderBackend,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<DynamicImage, ConversionError> {
    let session = backend.open_session()?;

    if bytes.is_empty() {
        return Err(ConversionError::DecodeFailure {
            detail: "payload is empty".into(),
        });
    }

    let document = session.load(bytes, password)?;
    let total_pages = document.page_count();
    info!("PDF loaded via {}: {} pages", backend.name(), total_pages);

    if total_pages == 0 {
        return Err(ConversionError::DecodeFailure {
            detail: "document has no pages".into(),
        });
    }

    let index = PREVIEW_PAGE - 1;
    let size = document.page_size(index)?;
    let viewport = Viewport::for_page(size, RENDER_SCALE);
    debug!(
        "Page {} is {}x{} pt → viewport {}x{} px",
        PREVIEW_PAGE, size.width_pt, size.height_pt, viewport.width, viewport.height
    );

    if viewport.is_empty() {
        return Err(ConversionError::RenderSurfaceUnavailable {
            width: viewport.width,
            height: viewport.height,
            detail: "page has no drawable area".into(),
        });
    }

    let image = document.render_page(index, viewport)?;
    debug!(
        "Rendered page {} → {}x{} px",
        PREVIEW_PAGE,
        image.width(),
        image.height()
    );
    Ok(image)
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// The process-wide pdfium binding. Never dropped: dropping a `Pdfium`
/// destroys the library under every other document still open.
static PDFIUM: OnceCell<Pdfium> = OnceCell::new();

/// Renders with the pdfium library.
///
/// The first successful bind is shared by every backend in the process, so
/// the lookup below only matters until then. A failed bind is not cached
/// and is retried on the next session.
///
/// The library is looked up in this order (first that binds wins):
///
/// 1. [`ConverterConfig::pdfium_library_path`]
/// 2. `PDFIUM_LIB_PATH`
/// 3. [`pdfium_cache_dir`]
/// 4. `./lib`
/// 5. the system library search path
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumBackend {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            library_path: config.pdfium_library_path.clone(),
        }
    }

    /// Library files to try before the system search path.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let lib_name = Pdfium::pdfium_platform_library_name();
        let mut paths = Vec::new();

        if let Some(ref p) = self.library_path {
            paths.push(p.clone());
        }
        if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
            if !p.is_empty() {
                paths.push(PathBuf::from(p));
            }
        }
        paths.push(pdfium_cache_dir().join(&lib_name));
        paths.push(PathBuf::from("./lib").join(&lib_name));
        paths
    }

    fn bind(&self) -> Result<Pdfium, ConversionError> {
        let mut attempts = Vec::new();

        for path in self.candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Pdfium::bind_to_library(&path) {
                Ok(bindings) => {
                    debug!("Bound pdfium from {}", path.display());
                    return Ok(Pdfium::new(bindings));
                }
                Err(e) => attempts.push(format!("{}: {}", path.display(), e)),
            }
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => Ok(Pdfium::new(bindings)),
            Err(e) => {
                attempts.push(format!("system library: {}", e));
                Err(ConversionError::EnvironmentUnsupported {
                    detail: format!(
                        "pdfium could not be bound ({}). Set PDFIUM_LIB_PATH to a libpdfium build.",
                        attempts.join("; ")
                    ),
                })
            }
        }
    }
}

impl RenderBackend for PdfiumBackend {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn open_session(&self) -> Result<Box<dyn RenderSession>, ConversionError> {
        let pdfium = PDFIUM.get_or_try_init(|| self.bind())?;
        Ok(Box::new(PdfiumSession { pdfium }))
    }
}

/// Per-user directory searched for a cached pdfium library.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/resumind/pdfium/`
/// - **Linux**: `~/.cache/resumind/pdfium/`
/// - **Windows**: `%LOCALAPPDATA%\resumind\pdfium\`
///
/// Override by setting `RESUMIND_PDFIUM_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RESUMIND_PDFIUM_DIR") {
        return PathBuf::from(dir);
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("resumind").join("pdfium")
}

struct PdfiumSession {
    pdfium: &'static Pdfium,
}

impl RenderSession for PdfiumSession {
    fn load<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Box<dyn LoadedDocument + 'a>, ConversionError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| ConversionError::DecodeFailure {
                detail: format!("{}", e),
            })?;

        Ok(Box::new(PdfiumDocument {
            pdfium: self.pdfium,
            document,
        }))
    }
}

struct PdfiumDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, ConversionError> {
        let idx = u16::try_from(index).map_err(|_| ConversionError::DecodeFailure {
            detail: format!("page index {} out of range", index),
        })?;
        self.document
            .pages()
            .get(idx)
            .map_err(|e| ConversionError::DecodeFailure {
                detail: format!("page {} unavailable: {}", index + 1, e),
            })
    }
}

impl LoadedDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, ConversionError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width_pt: page.width().value,
            height_pt: page.height().value,
        })
    }

    fn render_page(&self, index: usize, viewport: Viewport) -> Result<DynamicImage, ConversionError> {
        let page = self.page(index)?;
        let surface_err = |detail: String| ConversionError::RenderSurfaceUnavailable {
            width: viewport.width,
            height: viewport.height,
            detail,
        };

        let width = i32::try_from(viewport.width).map_err(|_| surface_err("width overflow".into()))?;
        let height =
            i32::try_from(viewport.height).map_err(|_| surface_err("height overflow".into()))?;

        let mut bitmap = PdfBitmap::empty(width, height, PdfBitmapFormat::BGRA, self.pdfium.bindings())
            .map_err(|e| surface_err(format!("{}", e)))?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        page.render_into_bitmap_with_config(&mut bitmap, &render_config)
            .map_err(|e| ConversionError::Unknown(format!("rendering page {} failed: {}", index + 1, e)))?;

        Ok(bitmap.as_image())
    }
}
