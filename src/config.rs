use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FocusLockConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub context: ContextConfig,
    pub model: ModelConfig,
    pub delivery: DeliveryConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub history_path: String,
    pub index_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContextConfig {
    pub window_size: usize,
    pub seed_query: String,
    pub similarity: bool,
    pub seed_history: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub name: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeliveryConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub chat_id: Option<String>,
    pub parse_mode: String,
    pub disable_link_preview: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

/// Bot token and recipient, both required to deliver anything.
#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_path: "data/history.json".into(),
            index_path: "data/index.db".into(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            seed_query: "recent tech activity".into(),
            similarity: false,
            seed_history: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".into(),
            name: "phi3:mini".into(),
            timeout_secs: 120,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".into(),
            token: None,
            chat_id: None,
            parse_mode: "Markdown".into(),
            disable_link_preview: true,
            timeout_secs: 15,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_focuslock_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

/// Returns `~/.focuslock/`, or `./.focuslock/` when there is no home directory.
pub fn default_focuslock_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".focuslock")
}

/// Returns the config file path: `$FOCUSLOCK_CONFIG` or `~/.focuslock/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("FOCUSLOCK_CONFIG") {
        Ok(path) => expand_tilde(&path),
        Err(_) => default_focuslock_dir().join("config.toml"),
    }
}

impl FocusLockConfig {
    /// Load config from the default location, apply env overrides, validate.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            FocusLockConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// `TELEGRAM_TOKEN` and `CHAT_ID` keep their bare names so existing cron
    /// environments work unchanged.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TELEGRAM_TOKEN") {
            self.delivery.token = Some(val);
        }
        if let Ok(val) = std::env::var("CHAT_ID") {
            self.delivery.chat_id = Some(val);
        }
        if let Ok(val) = std::env::var("FOCUSLOCK_HISTORY") {
            self.storage.history_path = val;
        }
        if let Ok(val) = std::env::var("FOCUSLOCK_INDEX") {
            self.storage.index_path = val;
        }
        if let Ok(val) = std::env::var("FOCUSLOCK_MODEL") {
            self.model.name = val;
        }
        if let Ok(val) = std::env::var("FOCUSLOCK_OLLAMA_URL") {
            self.model.endpoint = val;
        }
        if let Ok(val) = std::env::var("FOCUSLOCK_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.window_size == 0 {
            return Err(ConfigError::Invalid {
                field: "context.window_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "model.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.delivery.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "delivery.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Both delivery credentials, or the name of the first one missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let token = non_blank(self.delivery.token.as_deref())
            .ok_or(ConfigError::MissingCredential("TELEGRAM_TOKEN"))?;
        let chat_id = non_blank(self.delivery.chat_id.as_deref())
            .ok_or(ConfigError::MissingCredential("CHAT_ID"))?;
        Ok(Credentials {
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    pub fn resolved_history_path(&self) -> PathBuf {
        expand_tilde(&self.storage.history_path)
    }

    pub fn resolved_index_path(&self) -> PathBuf {
        expand_tilde(&self.storage.index_path)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
