use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ErrorKind;
use super::language::Language;

/// Outbound request body for the translation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: Vec<String>,
    pub target_lang: String,
    /// Left out of the body entirely for auto-detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
}

/// Response body returned by the translation endpoint. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    #[serde(default)]
    pub detected_source_language: Option<String>,
}

/// Outcome of a single translation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TranslationResult {
    Success {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detected_source_language: Option<String>,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

impl TranslationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationResult::Success { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TranslationResult::Success { text, .. } => Some(text),
            TranslationResult::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TranslationResult::Success { .. } => None,
            TranslationResult::Failure { message, .. } => Some(message),
        }
    }
}

/// Interface for a translation backend
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` into `target`.
    ///
    /// Never fails across the boundary; every error becomes
    /// [`TranslationResult::Failure`].
    async fn translate(&self, text: &str, source: Language, target: Language) -> TranslationResult;

    /// Free the underlying transport. Safe to call more than once.
    fn release(&self);
}
