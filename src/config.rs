//! Configuration types for résumé conversion and analysis.
//!
//! Two structs, two concerns:
//!
//! * [`ConverterConfig`]: where to find the rendering engine and how to open
//!   the document. The render scale and the previewed page are product
//!   decisions, not knobs, so they live here as constants instead.
//! * [`AnalysisConfig`]: which vision model reviews the preview and how.
//!
//! Both are built through builders whose `build()` validates constraints,
//! so an invalid combination is rejected before any work starts.

use crate::error::ConfigError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Scale factor applied to the page's intrinsic size (PDF points) when
/// rasterising. 4× turns a US-letter page into a 2448 × 3168 px preview,
/// large enough for a vision model to read 9 pt body text.
pub const RENDER_SCALE: f32 = 4.0;

/// The only page that is rendered (1-indexed).
pub const PREVIEW_PAGE: usize = 1;

/// MIME type of every produced image.
pub const PNG_MIME: &str = "image/png";

/// MIME type attached to uploaded résumé documents.
pub const PDF_MIME: &str = "application/pdf";

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

// ── Converter ────────────────────────────────────────────────────────────

/// Configuration for [`crate::convert::PdfToImageConverter`].
#[derive(Debug, Clone, Default)]
pub struct ConverterConfig {
    /// Explicit path to a pdfium shared library. Checked before
    /// `PDFIUM_LIB_PATH`, the cache directory and the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// PDF user password for encrypted résumés.
    pub password: Option<String>,
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConfigError> {
        if let Some(ref path) = self.config.pdfium_library_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError("pdfium library path must not be empty".into()));
            }
        }
        Ok(self.config)
    }
}

// ── Analysis ─────────────────────────────────────────────────────────────

/// Configuration for the résumé review step.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use resumind::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gpt-4.1-mini")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.model.as_deref(), Some("gpt-4.1-mini"));
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM model identifier, e.g. "gpt-4.1", "claude-sonnet-4-20250514".
    /// If None, uses [`DEFAULT_MODEL`] or the environment.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Feedback should be stable between runs on the same résumé, so the
    /// default stays low; scores still vary slightly at this setting.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// The structured feedback object with six sections and tips usually
    /// needs 1 500–2 500 tokens; a truncated object fails to parse.
    pub max_tokens: usize,

    /// Timeout for the feedback call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::FEEDBACK_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Receives stage updates while a résumé is being analysed.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            api_timeout_secs: 120,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ConfigError("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(ConfigError("api_timeout_secs must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.api_timeout_secs, 120);
        assert!(c.provider.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = AnalysisConfig::builder().temperature(7.5).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = AnalysisConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(err.to_string().contains("api_timeout_secs"));
    }

    #[test]
    fn empty_library_path_rejected() {
        assert!(ConverterConfig::builder()
            .pdfium_library_path("")
            .build()
            .is_err());
        let c = ConverterConfig::builder()
            .pdfium_library_path("/opt/pdfium/libpdfium.so")
            .build()
            .unwrap();
        assert!(c.pdfium_library_path.is_some());
    }

    #[test]
    fn debug_hides_prompt_body() {
        let c = AnalysisConfig::builder()
            .system_prompt("secret instructions")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret instructions"));
    }
}
