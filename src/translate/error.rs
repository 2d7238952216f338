use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failed translation, surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Protocol,
    Decode,
    Released,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("authorization failed ({status}); check that a valid API key is configured")]
    Unauthorized { status: u16 },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("connection timed out after {0} ms")]
    ConnectTimeout(u64),

    #[error("translation quota exceeded for this API key")]
    QuotaExceeded,

    #[error("too many requests; try again shortly")]
    RateLimited,

    #[error("translation service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not read translation response: {0}")]
    Decode(String),

    #[error("translation response contained no translations")]
    EmptyTranslations,

    #[error("translation client has been released")]
    Released,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Unauthorized { .. } => ErrorKind::Configuration,
            TranslateError::Transport(_)
            | TranslateError::Timeout(_)
            | TranslateError::ConnectTimeout(_) => ErrorKind::Transport,
            TranslateError::QuotaExceeded
            | TranslateError::RateLimited
            | TranslateError::Status { .. } => ErrorKind::Protocol,
            TranslateError::Decode(_) | TranslateError::EmptyTranslations => ErrorKind::Decode,
            TranslateError::Released => ErrorKind::Released,
        }
    }
}
