use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::TranslateError;
use super::interface::{TranslateRequest, TranslateResponse, Translation, TranslationResult, Translator};
use super::language::Language;

pub const DEFAULT_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";
pub const DEFAULT_AUTH_SCHEME: &str = "DeepL-Auth-Key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Transport settings for [`DeepLClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub auth_scheme: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            connect_timeout: DEFAULT_TIMEOUT,
            request_timeout: DEFAULT_TIMEOUT,
            use_system_proxy: true,
        }
    }
}

/// Client for the DeepL `/v2/translate` endpoint.
///
/// Owns its own connection pool. The credential is fixed for the lifetime of
/// the client; build a new client when it changes.
pub struct DeepLClient {
    transport: Mutex<Option<Client>>,
    credential: String,
    settings: ClientSettings,
}

impl DeepLClient {
    pub fn new(credential: impl Into<String>) -> Result<Self, TranslateError> {
        Self::with_settings(credential, ClientSettings::default())
    }

    pub fn with_settings(
        credential: impl Into<String>,
        settings: ClientSettings,
    ) -> Result<Self, TranslateError> {
        let mut builder = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout);
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }
        let transport = builder.build().map_err(TranslateError::Transport)?;

        info!(
            "Initialized DeepLClient: endpoint={}, connect_timeout={:?}, request_timeout={:?}",
            settings.endpoint, settings.connect_timeout, settings.request_timeout
        );

        Ok(Self {
            transport: Mutex::new(Some(transport)),
            credential: credential.into(),
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn is_released(&self) -> bool {
        self.transport.lock().unwrap_or_else(|e| e.into_inner()).is_none()
    }

    /// Build the request body for one call. `Auto` as source leaves
    /// `source_lang` out of the body.
    pub fn build_request(text: &str, source: Language, target: Language) -> TranslateRequest {
        TranslateRequest {
            text: vec![text.to_string()],
            target_lang: target.code().to_string(),
            source_lang: Some(source.code())
                .filter(|code| !code.is_empty())
                .map(str::to_string),
        }
    }

    /// Translate and return the first entry of the response, or a typed error.
    pub async fn try_translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<Translation, TranslateError> {
        let request = Self::build_request(text, source, target);
        debug!(
            "Sending translation request: source={}, target={}, chars={}",
            request.source_lang.as_deref().unwrap_or("auto"),
            request.target_lang,
            text.chars().count()
        );
        self.send(&request).await
    }

    async fn send(&self, request: &TranslateRequest) -> Result<Translation, TranslateError> {
        // Clone out of the lock; in-flight calls keep their own handle to the pool.
        let client = self
            .transport
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(TranslateError::Released)?;

        let response = client
            .post(&self.settings.endpoint)
            .header(AUTHORIZATION, format!("{} {}", self.settings.auth_scheme, self.credential))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(|e| TranslateError::Decode(e.to_string()))?;

        if parsed.translations.len() > 1 {
            debug!("Response carried {} translations, using the first", parsed.translations.len());
        }

        parsed
            .translations
            .into_iter()
            .next()
            .ok_or(TranslateError::EmptyTranslations)
    }

    fn transport_error(&self, err: reqwest::Error) -> TranslateError {
        if err.is_timeout() {
            timeout_error(&self.settings, err.is_connect())
        } else {
            TranslateError::Transport(err)
        }
    }
}

/// Name the timeout that actually fired.
fn timeout_error(settings: &ClientSettings, during_connect: bool) -> TranslateError {
    if during_connect {
        TranslateError::ConnectTimeout(settings.connect_timeout.as_millis() as u64)
    } else {
        TranslateError::Timeout(settings.request_timeout.as_millis() as u64)
    }
}

fn status_error(status: StatusCode, body: &str) -> TranslateError {
    match status.as_u16() {
        401 | 403 => TranslateError::Unauthorized { status: status.as_u16() },
        429 => TranslateError::RateLimited,
        456 => TranslateError::QuotaExceeded,
        code => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "unexpected status".to_string());
            TranslateError::Status { status: code, message }
        }
    }
}

#[async_trait]
impl Translator for DeepLClient {
    async fn translate(&self, text: &str, source: Language, target: Language) -> TranslationResult {
        match self.try_translate(text, source, target).await {
            Ok(translation) => TranslationResult::Success {
                text: translation.text,
                detected_source_language: translation.detected_source_language,
            },
            Err(err) => {
                match err {
                    TranslateError::Transport(_)
                    | TranslateError::Timeout(_)
                    | TranslateError::ConnectTimeout(_) => {
                        error!("Translation transport failure: {}", err)
                    }
                    _ => warn!("Translation failed: {}", err),
                }
                TranslationResult::Failure {
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        }
    }

    fn release(&self) {
        if self.transport.lock().unwrap_or_else(|e| e.into_inner()).take().is_some() {
            debug!("Released DeepLClient transport");
        }
    }
}

impl fmt::Debug for DeepLClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepLClient")
            .field("endpoint", &self.settings.endpoint)
            .field("credential_set", &!self.credential.is_empty())
            .field("released", &self.is_released())
            .finish()
    }
}
