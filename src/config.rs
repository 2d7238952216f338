use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::translate::{ClientSettings, Language, LanguagePair, DEFAULT_AUTH_SCHEME, DEFAULT_ENDPOINT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid substitution pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("default target language cannot be auto-detect")]
    AutoTarget,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub translator_config: TranslatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_credential_file")]
    pub credential_file: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    12393
}

fn default_credential_file() -> String {
    "config/api_key".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            credential_file: default_credential_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub use_system_proxy: bool,
    #[serde(default = "default_source")]
    pub default_source: Language,
    #[serde(default = "default_target")]
    pub default_target: Language,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_auth_scheme() -> String {
    DEFAULT_AUTH_SCHEME.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_source() -> Language {
    Language::Auto
}

fn default_target() -> Language {
    Language::English
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auth_scheme: default_auth_scheme(),
            connect_timeout_ms: default_timeout_ms(),
            request_timeout_ms: default_timeout_ms(),
            use_system_proxy: true,
            default_source: default_source(),
            default_target: default_target(),
        }
    }
}

impl TranslatorConfig {
    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("connect_timeout_ms"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("request_timeout_ms"));
        }
        Ok(ClientSettings {
            endpoint: self.endpoint.clone(),
            auth_scheme: self.auth_scheme.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            use_system_proxy: self.use_system_proxy,
        })
    }

    pub fn default_pair(&self) -> Result<LanguagePair, ConfigError> {
        if self.default_target.is_auto() {
            return Err(ConfigError::AutoTarget);
        }
        Ok(LanguagePair::new(self.default_source, self.default_target))
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file, chosen by extension
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::NotFound(path.to_string()));
        }
        let content = substitute_env(&read_text_file(path)?)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the first config file that exists. Missing files are skipped;
    /// any other failure stops the search.
    pub fn discover(paths: &[String]) -> Result<Option<(Self, String)>, ConfigError> {
        for path in paths {
            match Self::load(path) {
                Ok(config) => return Ok(Some((config, path.clone()))),
                Err(ConfigError::NotFound(_)) => debug!("No config at {}", path),
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.translator_config.client_settings()?;
        self.translator_config.default_pair()?;
        Ok(())
    }
}

/// Replace `${VAR_NAME}` with the environment value; unknown variables are left as-is.
fn substitute_env(content: &str) -> Result<String, ConfigError> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}

/// Read a text file, dropping a UTF-8 BOM and falling back to GBK for
/// non-UTF-8 content.
fn read_text_file(path: &str) -> Result<String, ConfigError> {
    let mut bytes = std::fs::read(path)?;
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(0..3);
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!("{} is not UTF-8, decoding as GBK", path);
            let (cow, _, _) = encoding_rs::GBK.decode(e.as_bytes());
            Ok(cow.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn defaults_use_free_endpoint_and_ten_second_timeouts() {
        let config = Config::default();
        let settings = config.translator_config.client_settings().unwrap();
        assert_eq!(settings.endpoint, "https://api-free.deepl.com/v2/translate");
        assert_eq!(settings.auth_scheme, "DeepL-Auth-Key");
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(config.translator_config.default_pair().unwrap(), LanguagePair::default());
    }

    #[test]
    fn loads_yaml_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "conf.yaml",
            b"system_config:\n  port: 9000\ntranslator_config:\n  request_timeout_ms: 2500\n  default_source: KO\n  default_target: JA\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.system_config.port, 9000);
        assert_eq!(config.system_config.host, "127.0.0.1");
        assert_eq!(config.translator_config.request_timeout_ms, 2500);
        assert_eq!(config.translator_config.connect_timeout_ms, 10_000);
        assert_eq!(
            config.translator_config.default_pair().unwrap(),
            LanguagePair::new(Language::Korean, Language::Japanese)
        );
    }

    #[test]
    fn loads_json_with_bom_and_env_substitution() {
        std::env::set_var("DEEPL_LOCAL_TEST_ENDPOINT", "http://localhost:9999/v2/translate");
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(
            br#"{"translator_config": {"endpoint": "${DEEPL_LOCAL_TEST_ENDPOINT}", "auth_scheme": "${DEEPL_LOCAL_UNSET_VAR}"}}"#,
        );
        let path = write_file(&dir, "conf.json", &bytes);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.translator_config.endpoint, "http://localhost:9999/v2/translate");
        assert_eq!(config.translator_config.auth_scheme, "${DEEPL_LOCAL_UNSET_VAR}");
    }

    #[test]
    fn rejects_zero_timeouts_and_auto_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "zero.yaml", b"translator_config:\n  connect_timeout_ms: 0\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::ZeroTimeout("connect_timeout_ms"))));

        let path = write_file(&dir, "auto.yaml", b"translator_config:\n  default_target: auto\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::AutoTarget)));
    }

    #[test]
    fn discover_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "conf.yaml", b"system_config:\n  port: 9100\n");
        let paths = vec![dir.path().join("absent.yaml").to_string_lossy().into_owned(), path.clone()];

        let (config, found) = Config::discover(&paths).unwrap().unwrap();
        assert_eq!(found, path);
        assert_eq!(config.system_config.port, 9100);

        assert!(Config::discover(&paths[..1]).unwrap().is_none());
    }

    #[test]
    fn discover_stops_on_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write_file(&dir, "conf.yaml", b"system_config: [unterminated\n");
        let valid = write_file(&dir, "conf.json", br#"{"system_config": {"port": 9200}}"#);

        let result = Config::discover(&[broken, valid]);
        assert!(matches!(result, Err(ConfigError::Yaml(_))));

        let invalid = write_file(&dir, "zero.yaml", b"translator_config:\n  request_timeout_ms: 0\n");
        assert!(matches!(
            Config::discover(&[invalid]),
            Err(ConfigError::ZeroTimeout("request_timeout_ms"))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            Config::load("/definitely/not/here.yaml"),
            Err(ConfigError::NotFound(_))
        ));
    }
}
