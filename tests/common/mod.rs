//! Shared fakes for the integration tests.
//!
//! `FakeBackend` stands in for pdfium: it "decodes" any payload starting
//! with `%PDF` and paints a solid white page at the requested viewport.
//! `ScriptedFeedback` returns a canned AI answer and records its calls.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use resumind::error::{ConversionError, ServiceError};
use resumind::feedback::FeedbackResponse;
use resumind::pipeline::render::{
    LoadedDocument, PageSize, RenderBackend, RenderSession, Viewport,
};
use resumind::services::{FeedbackService, MemoryKvStore, MemoryStorage};
use resumind::{
    AnalysisConfig, ConversionInput, ConverterConfig, PdfToImageConverter, ResumeAnalyzer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Route library logs to the test output. Set `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// How the fake engine behaves.
#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// No engine in this process.
    Headless,
    /// Renders `pages` pages of `width_pt` × `height_pt`.
    Ok {
        width_pt: f32,
        height_pt: f32,
        pages: usize,
    },
    /// Decodes fine but cannot allocate a drawing surface.
    NoSurface,
    /// Decodes fine but the draw call fails.
    RenderFails,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub sessions: AtomicUsize,
    pub loads: AtomicUsize,
    pub renders: AtomicUsize,
}

pub struct FakeBackend {
    pub mode: Mode,
    pub counters: Arc<Counters>,
}

impl FakeBackend {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            counters: Arc::new(Counters::default()),
        })
    }

    /// A 1-page document of 150 × 100 pt.
    pub fn small_page() -> Arc<Self> {
        Self::new(Mode::Ok {
            width_pt: 150.0,
            height_pt: 100.0,
            pages: 1,
        })
    }

    pub fn loads(&self) -> usize {
        self.counters.loads.load(Ordering::SeqCst)
    }

    pub fn renders(&self) -> usize {
        self.counters.renders.load(Ordering::SeqCst)
    }
}

impl RenderBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open_session(&self) -> Result<Box<dyn RenderSession>, ConversionError> {
        if let Mode::Headless = self.mode {
            return Err(ConversionError::EnvironmentUnsupported {
                detail: "no rendering engine in test host".into(),
            });
        }
        self.counters.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            mode: self.mode,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeSession {
    mode: Mode,
    counters: Arc<Counters>,
}

impl RenderSession for FakeSession {
    fn load<'a>(
        &'a self,
        bytes: &'a [u8],
        _password: Option<&'a str>,
    ) -> Result<Box<dyn LoadedDocument + 'a>, ConversionError> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if !bytes.starts_with(b"%PDF") {
            return Err(ConversionError::DecodeFailure {
                detail: "invalid PDF header".into(),
            });
        }
        Ok(Box::new(FakeDocument {
            mode: self.mode,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeDocument {
    mode: Mode,
    counters: Arc<Counters>,
}

impl LoadedDocument for FakeDocument {
    fn page_count(&self) -> usize {
        match self.mode {
            Mode::Ok { pages, .. } => pages,
            _ => 1,
        }
    }

    fn page_size(&self, _index: usize) -> Result<PageSize, ConversionError> {
        Ok(match self.mode {
            Mode::Ok {
                width_pt,
                height_pt,
                ..
            } => PageSize {
                width_pt,
                height_pt,
            },
            _ => PageSize {
                width_pt: 150.0,
                height_pt: 100.0,
            },
        })
    }

    fn render_page(
        &self,
        _index: usize,
        viewport: Viewport,
    ) -> Result<DynamicImage, ConversionError> {
        match self.mode {
            Mode::NoSurface => Err(ConversionError::RenderSurfaceUnavailable {
                width: viewport.width,
                height: viewport.height,
                detail: "simulated allocation failure".into(),
            }),
            Mode::RenderFails => Err(ConversionError::Unknown("simulated draw failure".into())),
            _ => {
                self.counters.renders.fetch_add(1, Ordering::SeqCst);
                let img = RgbaImage::from_pixel(
                    viewport.width,
                    viewport.height,
                    Rgba([255, 255, 255, 255]),
                );
                Ok(DynamicImage::ImageRgba8(img))
            }
        }
    }
}

/// A tiny payload the fake backend accepts.
pub fn fake_pdf(name: &str) -> ConversionInput {
    ConversionInput::new(name, b"%PDF-1.7\n%fake\n".to_vec())
}

pub fn converter(backend: Arc<FakeBackend>) -> PdfToImageConverter {
    init_tracing();
    PdfToImageConverter::with_backend(backend, ConverterConfig::default())
}

// ── Feedback ─────────────────────────────────────────────────────────────

pub enum Reply {
    Answer(FeedbackResponse),
    Fail(String),
}

/// Feedback service returning a fixed reply.
pub struct ScriptedFeedback {
    reply: Reply,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedFeedback {
    pub fn answering(text: &str) -> Arc<Self> {
        Self::with_reply(Reply::Answer(FeedbackResponse::text(text)))
    }

    pub fn with_reply(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedbackService for ScriptedFeedback {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<FeedbackResponse, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((document_path.to_string(), instructions.to_string()));
        match &self.reply {
            Reply::Answer(r) => Ok(r.clone()),
            Reply::Fail(msg) => Err(ServiceError::LlmApiError {
                message: msg.clone(),
            }),
        }
    }
}

/// An analyzer wired to in-memory collaborators.
pub struct Harness {
    pub analyzer: ResumeAnalyzer,
    pub storage: Arc<MemoryStorage>,
    pub kv: Arc<MemoryKvStore>,
    pub ai: Arc<ScriptedFeedback>,
    pub backend: Arc<FakeBackend>,
}

pub fn harness(backend: Arc<FakeBackend>, ai: Arc<ScriptedFeedback>, config: AnalysisConfig) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let kv = Arc::new(MemoryKvStore::new());
    let analyzer = ResumeAnalyzer::new(
        converter(Arc::clone(&backend)),
        storage.clone(),
        kv.clone(),
        ai.clone(),
        &config,
    );
    Harness {
        analyzer,
        storage,
        kv,
        ai,
        backend,
    }
}
