use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::translate::{Language, LanguagePair, TranslationResult};

/// Character counter limit shown to the user. Informational only.
pub const CHARACTER_LIMIT: usize = 5000;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("'{0}' cannot be used as a target language")]
    InvalidTarget(Language),
}

/// One translation handed to a worker
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationJob {
    pub token: Uuid,
    pub text: String,
    pub pair: LanguagePair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub character_count: usize,
    pub character_limit: usize,
    pub over_limit: bool,
    pub translating: bool,
}

/// UI-side state for one connected frontend.
///
/// At most one translation is in flight. Its token is the only one whose
/// result is accepted; anything else is a late answer from an abandoned call.
#[derive(Debug, Default)]
pub struct Session {
    pair: LanguagePair,
    in_flight: Option<Uuid>,
    last_result: Option<TranslationResult>,
}

impl Session {
    pub fn new(pair: LanguagePair) -> Self {
        Self {
            pair,
            ..Default::default()
        }
    }

    pub fn pair(&self) -> LanguagePair {
        self.pair
    }

    pub fn set_pair(&mut self, pair: LanguagePair) -> Result<(), SessionError> {
        if pair.target.is_auto() {
            return Err(SessionError::InvalidTarget(pair.target));
        }
        self.pair = pair;
        Ok(())
    }

    pub fn swap(&mut self) -> bool {
        self.pair.swap()
    }

    pub fn is_translating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<Uuid> {
        self.in_flight
    }

    pub fn last_result(&self) -> Option<&TranslationResult> {
        self.last_result.as_ref()
    }

    /// Start a translation. Blank input and re-entry while a call is
    /// outstanding are dropped.
    pub fn begin(&mut self, text: &str) -> Option<TranslationJob> {
        if text.trim().is_empty() {
            debug!("Ignoring translate request with blank input");
            return None;
        }
        if let Some(token) = self.in_flight {
            debug!("Ignoring translate request; {} still in flight", token);
            return None;
        }

        let token = Uuid::new_v4();
        self.in_flight = Some(token);
        Some(TranslationJob {
            token,
            text: text.to_string(),
            pair: self.pair,
        })
    }

    /// Apply a finished call. Returns the accepted result, or `None` if the
    /// token is not the one in flight.
    pub fn complete(&mut self, token: Uuid, result: TranslationResult) -> Option<&TranslationResult> {
        if self.in_flight != Some(token) {
            debug!("Discarding stale translation result {}", token);
            return None;
        }
        self.in_flight = None;
        self.last_result = Some(result);
        self.last_result.as_ref()
    }

    /// Forget the outstanding call, if any.
    pub fn abandon(&mut self) -> Option<Uuid> {
        self.in_flight.take()
    }

    pub fn status(&self, text: &str) -> SessionStatus {
        let character_count = char_count(text);
        SessionStatus {
            character_count,
            character_limit: CHARACTER_LIMIT,
            over_limit: character_count > CHARACTER_LIMIT,
            translating: self.is_translating(),
        }
    }
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Text for the output pane
pub fn display_text(result: &TranslationResult) -> String {
    match result {
        TranslationResult::Success { text, .. } => text.clone(),
        TranslationResult::Failure { message, .. } => format!("❌ Error: {}", message),
    }
}
