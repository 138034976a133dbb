//! Résumé review through a vision-capable LLM.
//!
//! The stored document is read back from [`FileStorage`], base64-wrapped
//! and sent with the per-request instructions in a single chat call. No
//! retries: a failed or timed-out call surfaces as an error and the caller
//! decides what to do with the record.

use super::{FeedbackService, FileStorage};
use crate::config::{AnalysisConfig, DEFAULT_MODEL};
use crate::error::ServiceError;
use crate::feedback::FeedbackResponse;
use crate::pipeline::encode::{encode_for_vision, sniff_image_mime};
use crate::prompts::FEEDBACK_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Feedback from an `edgequake-llm` provider.
pub struct LlmFeedbackService {
    provider: Arc<dyn LLMProvider>,
    storage: Arc<dyn FileStorage>,
    config: AnalysisConfig,
}

impl LlmFeedbackService {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        storage: Arc<dyn FileStorage>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            config,
        }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(
        storage: Arc<dyn FileStorage>,
        config: AnalysisConfig,
    ) -> Result<Self, ServiceError> {
        let provider = resolve_provider(&config)?;
        Ok(Self::new(provider, storage, config))
    }
}

#[async_trait]
impl FeedbackService for LlmFeedbackService {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<FeedbackResponse, ServiceError> {
        let start = Instant::now();
        let bytes = self.storage.read(document_path).await?;
        let mime = sniff_image_mime(&bytes).ok_or_else(|| ServiceError::UnsupportedDocument {
            path: document_path.to_string(),
        })?;

        let messages = vec![
            ChatMessage::system(system_prompt(&self.config)),
            ChatMessage::user_with_images(instructions, vec![encode_for_vision(&bytes, mime)]),
        ];
        let options = build_options(&self.config);

        let secs = self.config.api_timeout_secs;
        let call = self.provider.chat(&messages, Some(&options));
        let response = match tokio::time::timeout(Duration::from_secs(secs), call).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!("Feedback call for '{}' failed: {}", document_path, e);
                return Err(ServiceError::LlmApiError {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                warn!("Feedback call for '{}' timed out after {}s", document_path, secs);
                return Err(ServiceError::ApiTimeout { secs });
            }
        };

        debug!(
            "Feedback: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        if response.content.trim().is_empty() {
            return Err(ServiceError::EmptyResult {
                service: "AI feedback",
            });
        }
        info!(
            "Feedback for '{}' received in {:?}",
            document_path,
            start.elapsed()
        );
        Ok(FeedbackResponse::text(response.content))
    }
}

fn system_prompt(config: &AnalysisConfig) -> &str {
    config
        .system_prompt
        .as_deref()
        .unwrap_or(FEEDBACK_SYSTEM_PROMPT)
}

fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Pick the LLM provider for `config`.
///
/// Resolution order:
/// 1. `config.provider` (pre-built)
/// 2. `config.provider_name` with `config.model` or [`DEFAULT_MODEL`]
/// 3. `RESUMIND_LLM_PROVIDER` + `RESUMIND_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. `ProviderFactory::from_env` auto-detection
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, ServiceError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("RESUMIND_LLM_PROVIDER"),
        std::env::var("RESUMIND_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider("openai", model);
    }

    let (llm_provider, _) =
        ProviderFactory::from_env().map_err(|e| ServiceError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider auto-detected: {e}\n\
                 Set OPENAI_API_KEY, or RESUMIND_LLM_PROVIDER and RESUMIND_MODEL."
            ),
        })?;
    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ServiceError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ServiceError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NamedFile;
    use crate::services::MemoryStorage;
    use edgequake_llm::{LLMResponse, MockProvider};

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    /// Never answers.
    struct StalledProvider;

    #[async_trait]
    impl LLMProvider for StalledProvider {
        fn name(&self) -> &str {
            "stalled"
        }

        fn model(&self) -> &str {
            "stalled-model"
        }

        fn max_context_length(&self) -> usize {
            4096
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            std::future::pending().await
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete(prompt).await
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete("").await
        }
    }

    async fn store(storage: &MemoryStorage, name: &str, bytes: &[u8], mime: &str) -> String {
        storage
            .upload(vec![NamedFile::new(name, bytes.to_vec(), mime)])
            .await
            .unwrap()
            .path
    }

    fn service(provider: Arc<dyn LLMProvider>, storage: Arc<MemoryStorage>) -> LlmFeedbackService {
        LlmFeedbackService::new(provider, storage, AnalysisConfig::default())
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"rest of the image");
        bytes
    }

    #[tokio::test]
    async fn stored_image_gets_model_answer() {
        let storage = Arc::new(MemoryStorage::new());
        let path = store(&storage, "cv.png", &png_bytes(), "image/png").await;
        let mock = MockProvider::new();
        mock.add_response("```json\n{\"overallScore\": 5}\n```").await;

        let response = service(Arc::new(mock), storage)
            .feedback(&path, "Review this.")
            .await
            .unwrap();
        assert_eq!(
            response.content_text(),
            Some("```json\n{\"overallScore\": 5}\n```")
        );
    }

    #[tokio::test]
    async fn pdf_is_unsupported_document() {
        let storage = Arc::new(MemoryStorage::new());
        let path = store(&storage, "cv.pdf", b"%PDF-1.7\n", "application/pdf").await;

        let err = service(Arc::new(MockProvider::new()), storage)
            .feedback(&path, "Review this.")
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::UnsupportedDocument { path: ref p } if *p == path),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let err = service(Arc::new(MockProvider::new()), storage)
            .feedback("uploads/none/cv.png", "Review this.")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn blank_answer_is_empty_result() {
        let storage = Arc::new(MemoryStorage::new());
        let path = store(&storage, "cv.png", &png_bytes(), "image/png").await;
        let mock = MockProvider::new();
        mock.add_response("  \n ").await;

        let err = service(Arc::new(mock), storage)
            .feedback(&path, "Review this.")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResult { .. }), "got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out() {
        let storage = Arc::new(MemoryStorage::new());
        let path = store(&storage, "cv.png", &png_bytes(), "image/png").await;
        let config = AnalysisConfig::builder().api_timeout_secs(5).build().unwrap();

        let err = LlmFeedbackService::new(Arc::new(StalledProvider), storage, config)
            .feedback(&path, "Review this.")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ApiTimeout { secs: 5 }), "got {err:?}");
    }

    #[test]
    fn options_follow_config() {
        let config = AnalysisConfig::builder()
            .temperature(0.5)
            .max_tokens(1000)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.5));
        assert_eq!(opts.max_tokens, Some(1000));
    }

    #[test]
    fn system_prompt_override() {
        assert_eq!(system_prompt(&AnalysisConfig::default()), FEEDBACK_SYSTEM_PROMPT);
        let config = AnalysisConfig::builder()
            .system_prompt("Be brief.")
            .build()
            .unwrap();
        assert_eq!(system_prompt(&config), "Be brief.");
    }
}
