use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

pub const API_KEY_ENV: &str = "DEEPL_API_KEY";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to write credential file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the API key lives between runs
pub trait CredentialStore: Send + Sync {
    /// Current credential, or an empty string when none is configured
    fn get(&self) -> String;

    fn set(&self, credential: String) -> Result<(), CredentialError>;

    fn is_configured(&self) -> bool {
        !self.get().trim().is_empty()
    }
}

/// Stores the key in a plain file. A missing or empty file falls back to
/// the `DEEPL_API_KEY` environment variable.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Some(content.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read credential file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> String {
        self.read_file()
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|s| !s.trim().is_empty()))
            .unwrap_or_default()
    }

    fn set(&self, credential: String) -> Result<(), CredentialError> {
        let to_write = |source: std::io::Error| CredentialError::Write { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(to_write)?;
        }
        std::fs::write(&self.path, credential.trim()).map_err(to_write)?;
        debug!("Stored credential in {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: RwLock<String>,
}

impl MemoryCredentialStore {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: RwLock::new(value.into()) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> String {
        self.value.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, credential: String) -> Result<(), CredentialError> {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = credential;
        Ok(())
    }
}
