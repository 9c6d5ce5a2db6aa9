//! Application configuration management.
//!
//! This module handles loading and saving the console configuration: the
//! API base URL, list and request tuning, the remember-me preference, the
//! last used username and where durable credentials are kept.
//!
//! Configuration is stored at `~/.config/havirkesht/config.json`.
//! `HAVIRKESHT_API_URL` and `HAVIRKESHT_USERNAME` override the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ReqwestTransport, DEFAULT_API_BASE_URL};
use crate::auth::{FileStore, KeyValueStore, KeyringStore, MemoryStore, SessionStore};
use crate::listing::DEFAULT_PAGE_SIZE;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "havirkesht";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "HAVIRKESHT_API_URL";
pub const ENV_USERNAME: &str = "HAVIRKESHT_USERNAME";
pub const ENV_PASSWORD: &str = "HAVIRKESHT_PASSWORD";

/// Where the durable session tier lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// The OS keychain
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub page_size: u32,
    pub search_quiet_ms: u64,
    pub request_timeout_secs: u64,
    pub remember_me: bool,
    pub last_username: Option<String>,
    pub credential_backend: CredentialBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            search_quiet_ms: 500,
            request_timeout_secs: 30,
            remember_me: false,
            last_username: None,
            credential_backend: CredentialBackend::File,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(username) = non_empty(ENV_USERNAME) {
            self.last_username = Some(username.trim().to_string());
        }
    }

    /// Password for non-interactive login, if provided.
    pub fn env_password() -> Option<String> {
        std::env::var(ENV_PASSWORD).ok().filter(|v| !v.is_empty())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }

    pub fn search_quiet_period(&self) -> Duration {
        Duration::from_millis(self.search_quiet_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Session store with the configured durable tier and an in-process
    /// ephemeral tier.
    pub fn session_store(&self) -> Result<SessionStore> {
        let durable: Arc<dyn KeyValueStore> = match self.credential_backend {
            CredentialBackend::File => Arc::new(FileStore::in_dir(&self.cache_dir()?)),
            CredentialBackend::Keyring => Arc::new(KeyringStore::new()),
        };
        Ok(SessionStore::new(durable, Arc::new(MemoryStore::new())))
    }

    pub fn api_client(&self, session: Arc<SessionStore>) -> Result<ApiClient> {
        let transport = ReqwestTransport::new(self.request_timeout())
            .context("Failed to build HTTP client")?;
        Ok(ApiClient::new(&self.api_base_url, Arc::new(transport), session))
    }
}
