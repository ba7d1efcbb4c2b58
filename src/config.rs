use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::memory::context::MessageSelection;
use crate::memory::entities::UpsertStrategy;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ConcordConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub context: ContextConfig,
    pub entities: EntitiesConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"stdio"` or `"http"`.
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContextConfig {
    /// `"head"` returns the earliest stored messages, `"tail"` the latest.
    pub message_selection: MessageSelection,
    pub default_max_messages: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EntitiesConfig {
    /// `"replace"` or `"append_observations"`.
    pub upsert_strategy: UpsertStrategy,
    pub context_entity_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub default_max_results: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_concord_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            message_selection: MessageSelection::Head,
            default_max_messages: 20,
        }
    }
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self {
            upsert_strategy: UpsertStrategy::Replace,
            context_entity_limit: 10,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: 10,
        }
    }
}

/// Returns `~/.concord/`, or `./.concord/` when no home directory is known.
pub fn default_concord_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".concord")
}

/// Returns the default config file path: `~/.concord/config.toml`
pub fn default_config_path() -> PathBuf {
    default_concord_dir().join("config.toml")
}

impl ConcordConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ConcordConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (CONCORD_DB, CONCORD_LOG_LEVEL, CONCORD_TRANSPORT).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CONCORD_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CONCORD_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("CONCORD_TRANSPORT") {
            self.server.transport = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
