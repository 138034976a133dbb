//! AI feedback responses and their JSON payload.
//!
//! The inference service answers with `{ message: { content } }` where
//! `content` is either a plain string or a list of text parts. Either way the
//! text is expected to be a JSON document, sometimes wrapped in a
//! ```` ```json ```` fence despite the prompt asking otherwise.

use crate::error::WorkflowError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A response from the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub message: FeedbackMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub content: MessageContent,
}

/// Message content: a single string, or text parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    pub text: String,
}

impl FeedbackResponse {
    /// A response whose content is a single string.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: FeedbackMessage {
                content: MessageContent::Text(content.into()),
            },
        }
    }

    /// The string content, or the first part's text. `None` when there are
    /// no parts.
    pub fn content_text(&self) -> Option<&str> {
        match &self.message.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(parts) => parts.first().map(|p| p.text.as_str()),
        }
    }
}

static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

/// Remove every ```` ```json ```` / ```` ``` ```` marker and trim.
pub fn strip_json_fences(text: &str) -> String {
    RE_JSON_FENCE.replace_all(text, "").trim().to_string()
}

/// Parse the model's text as JSON, tolerating code fences.
pub fn parse_feedback_json(text: &str) -> Result<serde_json::Value, WorkflowError> {
    let cleaned = strip_json_fences(text);
    serde_json::from_str(&cleaned).map_err(|e| WorkflowError::InvalidAiJson {
        detail: e.to_string(),
    })
}
