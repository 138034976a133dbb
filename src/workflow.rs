//! Upload, convert and review a résumé.
//!
//! ```text
//! upload PDF ─▶ convert page 1 ─▶ upload PNG ─▶ write record ─▶ AI feedback ─▶ parse ─▶ write record
//! ```
//!
//! Each step aborts the flow on failure. A failed conversion leaves nothing
//! behind but the uploaded PDF; a failed review leaves the record with an
//! empty `feedback`.

use crate::config::{AnalysisConfig, PDF_MIME};
use crate::convert::PdfToImageConverter;
use crate::error::{ServiceError, WorkflowError};
use crate::feedback::parse_feedback_json;
use crate::output::{ConversionInput, NamedFile};
use crate::progress::{AnalysisStage, NoopProgressCallback, ProgressCallback};
use crate::prompts::prepare_instructions;
use crate::services::{FeedbackService, FileStorage, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Key under which a record is stored.
pub fn record_key(id: &str) -> String {
    format!("resume:{id}")
}

/// One résumé submission and its review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    /// Parsed feedback object; the empty string until the review lands.
    #[serde(default = "empty_feedback")]
    pub feedback: serde_json::Value,
}

fn empty_feedback() -> serde_json::Value {
    serde_json::Value::String(String::new())
}

impl ResumeRecord {
    /// True once the AI feedback has been stored.
    pub fn has_feedback(&self) -> bool {
        self.feedback != empty_feedback()
    }
}

/// What the user submitted.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub resume: ConversionInput,
}

/// Drives [`AnalyzeRequest`]s through conversion, storage and review.
pub struct ResumeAnalyzer {
    converter: PdfToImageConverter,
    storage: Arc<dyn FileStorage>,
    kv: Arc<dyn KeyValueStore>,
    ai: Arc<dyn FeedbackService>,
    progress: ProgressCallback,
}

impl ResumeAnalyzer {
    pub fn new(
        converter: PdfToImageConverter,
        storage: Arc<dyn FileStorage>,
        kv: Arc<dyn KeyValueStore>,
        ai: Arc<dyn FeedbackService>,
        config: &AnalysisConfig,
    ) -> Self {
        let progress = config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback));
        Self {
            converter,
            storage,
            kv,
            ai,
            progress,
        }
    }

    pub fn converter(&self) -> &PdfToImageConverter {
        &self.converter
    }

    /// Run the full flow and return the final record.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<ResumeRecord, WorkflowError> {
        let result = self.run(request).await;
        match &result {
            Ok(record) => self.progress.on_complete(&record.id),
            Err((stage, e)) => {
                warn!("Résumé analysis failed while {}: {}", stage, e);
                self.progress.on_failure(*stage, &e.to_string());
            }
        }
        result.map_err(|(_, e)| e)
    }

    async fn run(
        &self,
        request: AnalyzeRequest,
    ) -> Result<ResumeRecord, (AnalysisStage, WorkflowError)> {
        let AnalyzeRequest {
            company_name,
            job_title,
            job_description,
            resume,
        } = request;

        // ── Upload the PDF ───────────────────────────────────────────────
        let stage = self.enter(AnalysisStage::UploadingResume);
        let pdf = NamedFile::new(resume.file_name.clone(), resume.bytes.clone(), PDF_MIME);
        let uploaded = self
            .storage
            .upload(vec![pdf])
            .await
            .map_err(|e| (stage, WorkflowError::ResumeUploadFailed(e)))?;

        // ── Convert page 1 ───────────────────────────────────────────────
        let stage = self.enter(AnalysisStage::ConvertingResume);
        let converted = self
            .converter
            .convert(resume)
            .await
            .map_err(|e| (stage, WorkflowError::ConversionFailed(e)))?;

        // ── Upload the PNG ───────────────────────────────────────────────
        let stage = self.enter(AnalysisStage::UploadingImage);
        let image = self.storage.upload(vec![converted.file]).await;
        // The preview handle is only needed until the image is stored.
        converted.image_url.revoke();
        let image = image.map_err(|e| (stage, WorkflowError::ImageUploadFailed(e)))?;

        // ── Write the record ─────────────────────────────────────────────
        let stage = self.enter(AnalysisStage::PreparingData);
        let mut record = ResumeRecord {
            id: Uuid::new_v4().to_string(),
            resume_path: uploaded.path,
            image_path: image.path,
            company_name,
            job_title,
            job_description,
            feedback: empty_feedback(),
        };
        self.store(&record).await.map_err(|e| (stage, e))?;

        // ── Review ───────────────────────────────────────────────────────
        let stage = self.enter(AnalysisStage::Analyzing);
        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        let response = self
            .ai
            .feedback(&record.image_path, &instructions)
            .await
            .map_err(|e| (stage, WorkflowError::AnalysisFailed(e)))?;
        let text = response.content_text().ok_or_else(|| {
            (
                stage,
                WorkflowError::AnalysisFailed(ServiceError::EmptyResult {
                    service: "AI feedback",
                }),
            )
        })?;
        record.feedback = parse_feedback_json(text).map_err(|e| (stage, e))?;
        self.store(&record).await.map_err(|e| (stage, e))?;

        self.progress.on_stage(AnalysisStage::Complete);
        info!("Résumé '{}' analysed", record.id);
        Ok(record)
    }

    /// Read a stored record back.
    pub async fn load_record(&self, id: &str) -> Result<ResumeRecord, WorkflowError> {
        load_record(self.kv.as_ref(), id).await
    }

    fn enter(&self, stage: AnalysisStage) -> AnalysisStage {
        info!("{}", stage);
        self.progress.on_stage(stage);
        stage
    }

    async fn store(&self, record: &ResumeRecord) -> Result<(), WorkflowError> {
        let key = record_key(&record.id);
        let write = |source| WorkflowError::RecordWriteFailed {
            key: key.clone(),
            source,
        };
        let value = serde_json::to_string(record).map_err(|e| write(ServiceError::from(e)))?;
        self.kv.set(&key, &value).await.map_err(write)
    }
}

/// Read the record `id` from `kv`.
pub async fn load_record(kv: &dyn KeyValueStore, id: &str) -> Result<ResumeRecord, WorkflowError> {
    let key = record_key(id);
    let read = |source| WorkflowError::RecordReadFailed {
        key: key.clone(),
        source,
    };
    let raw = kv
        .get(&key)
        .await
        .map_err(&read)?
        .ok_or_else(|| WorkflowError::RecordNotFound { id: id.to_string() })?;
    serde_json::from_str(&raw).map_err(|e| read(ServiceError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serialises_camel_case() {
        let record = ResumeRecord {
            id: "abc".into(),
            resume_path: "uploads/1/cv.pdf".into(),
            image_path: "uploads/2/cv.png".into(),
            company_name: "Acme".into(),
            job_title: "Engineer".into(),
            job_description: "Build things".into(),
            feedback: empty_feedback(),
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["resumePath"], "uploads/1/cv.pdf");
        assert_eq!(v["imagePath"], "uploads/2/cv.png");
        assert_eq!(v["companyName"], "Acme");
        assert_eq!(v["feedback"], "");
        assert!(!record.has_feedback());
    }

    #[test]
    fn missing_feedback_defaults_to_empty() {
        let record: ResumeRecord = serde_json::from_str(
            r#"{"id":"x","resumePath":"a","imagePath":"b","companyName":"","jobTitle":"","jobDescription":""}"#,
        )
        .unwrap();
        assert_eq!(record.feedback, empty_feedback());
    }

    #[test]
    fn key_format() {
        assert_eq!(record_key("42"), "resume:42");
    }

    #[test]
    fn load_missing_record() {
        let kv = crate::services::MemoryKvStore::new();
        let err = tokio_test::block_on(load_record(&kv, "nope")).unwrap_err();
        assert!(matches!(err, WorkflowError::RecordNotFound { .. }));
    }

    #[test]
    fn corrupt_record_is_read_failure() {
        let kv = crate::services::MemoryKvStore::new();
        tokio_test::block_on(async {
            kv.set(&record_key("x"), "not json").await.unwrap();
            let err = load_record(&kv, "x").await.unwrap_err();
            assert!(matches!(err, WorkflowError::RecordReadFailed { .. }));
        });
    }
}
