//! Progress-callback trait for résumé analysis stages.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! an event each time [`crate::workflow::ResumeAnalyzer::analyze`] moves to
//! the next step, and one when it fails.
//!
//! # Example
//!
//! ```rust
//! use resumind::{AnalysisConfig, AnalysisProgressCallback, AnalysisStage};
//! use std::sync::Arc;
//!
//! struct PrintStatus;
//!
//! impl AnalysisProgressCallback for PrintStatus {
//!     fn on_stage(&self, stage: AnalysisStage) {
//!         eprintln!("{}", stage.status_text());
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(PrintStatus) as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Steps of the upload-and-analyse flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    UploadingResume,
    ConvertingResume,
    UploadingImage,
    PreparingData,
    Analyzing,
    Complete,
}

impl AnalysisStage {
    /// User-facing status line for this stage.
    pub fn status_text(&self) -> &'static str {
        match self {
            AnalysisStage::UploadingResume => "Uploading resume...",
            AnalysisStage::ConvertingResume => "Converting resume to image...",
            AnalysisStage::UploadingImage => "Uploading image...",
            AnalysisStage::PreparingData => "Preparing data...",
            AnalysisStage::Analyzing => "Analyzing resume with AI...",
            AnalysisStage::Complete => "Analysis complete.",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Called by the analysis workflow as it advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called when the workflow enters `stage`.
    fn on_stage(&self, stage: AnalysisStage) {
        let _ = stage;
    }

    /// Called once when the workflow aborts during `stage`.
    ///
    /// `error` carries the detailed reason; user-facing surfaces usually show
    /// a generic message and log this one.
    fn on_failure(&self, stage: AnalysisStage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the final record has been written.
    fn on_complete(&self, record_id: &str) {
        let _ = record_id;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<AnalysisStage>>,
        failures: Mutex<Vec<(AnalysisStage, String)>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_stage(&self, stage: AnalysisStage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_failure(&self, stage: AnalysisStage, error: &str) {
            self.failures.lock().unwrap().push((stage, error.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage(AnalysisStage::UploadingResume);
        cb.on_failure(AnalysisStage::ConvertingResume, "bad pdf");
        cb.on_complete("abc");
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage(AnalysisStage::UploadingResume);
        rec.on_stage(AnalysisStage::ConvertingResume);
        rec.on_failure(AnalysisStage::ConvertingResume, "decode");

        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![AnalysisStage::UploadingResume, AnalysisStage::ConvertingResume]
        );
        assert_eq!(rec.failures.lock().unwrap().len(), 1);
    }

    #[test]
    fn status_text_matches_display() {
        assert_eq!(
            AnalysisStage::Analyzing.to_string(),
            "Analyzing resume with AI..."
        );
    }
}
