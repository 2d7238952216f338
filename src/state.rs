use std::sync::Arc;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::credential::CredentialStore;
use crate::translate::{ClientSettings, DeepLClient, LanguagePair, Translator};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub credentials: Arc<dyn CredentialStore>,
    pub translator: Arc<RwLock<Arc<dyn Translator>>>,
    pub translation_tasks: Arc<DashMap<String, tokio::task::AbortHandle>>,
    settings: ClientSettings,
    default_pair: LanguagePair,
}

impl AppState {
    pub fn new(config: Config, credentials: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let settings = config.translator_config.client_settings()?;
        let default_pair = config.translator_config.default_pair()?;
        let client = DeepLClient::with_settings(credentials.get(), settings.clone())?;

        if !credentials.is_configured() {
            info!("No API key configured yet; translations will fail until one is set");
        }

        Ok(Self {
            config,
            credentials,
            translator: Arc::new(RwLock::new(Arc::new(client))),
            translation_tasks: Arc::new(DashMap::new()),
            settings,
            default_pair,
        })
    }

    pub async fn translator(&self) -> Arc<dyn Translator> {
        self.translator.read().await.clone()
    }

    pub fn default_pair(&self) -> LanguagePair {
        self.default_pair
    }

    /// Persist a new credential and swap in a fresh client built with it.
    /// The old client is released; calls already running on it finish on
    /// their own handle.
    pub async fn replace_credential(&self, credential: String) -> anyhow::Result<()> {
        self.credentials.set(credential)?;
        let client: Arc<dyn Translator> =
            Arc::new(DeepLClient::with_settings(self.credentials.get(), self.settings.clone())?);

        let old = {
            let mut current = self.translator.write().await;
            std::mem::replace(&mut *current, client)
        };
        old.release();
        info!("Credential updated; translation client rebuilt");
        Ok(())
    }

    pub async fn shutdown(&self) {
        for entry in self.translation_tasks.iter() {
            entry.value().abort();
        }
        self.translation_tasks.clear();
        self.translator.read().await.release();
    }

    pub fn generate_client_uid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
