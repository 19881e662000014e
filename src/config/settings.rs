//! Process-level settings
//!
//! Loaded once at startup from `~/.docuchat/config.toml` (created with
//! defaults when missing), then overlaid with environment variables.
//! Vector-store credentials stay environment-only: their absence is a
//! configuration-time failure at the point of first use, not here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable naming the SQLite database location
pub const DATABASE_ENV: &str = "DOCUCHAT_DATABASE";

/// Environment variable for the chat/embeddings endpoint
pub const CHAT_URL_ENV: &str = "DOCUCHAT_CHAT_URL";

/// Environment variable for the qdrant endpoint (read by the retriever
/// factory, listed here for documentation)
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub models: ModelsSettings,

    #[serde(default)]
    pub endpoints: EndpointSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelsSettings {
    /// Default query model, overriding the built-in default
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Base URL of the chat/embeddings endpoint
    pub chat_url: String,

    /// Embedding model served at the chat endpoint
    pub embedding_model: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            chat_url: "http://127.0.0.1:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database holding conversations and checkpoints
    pub database: Option<PathBuf>,

    /// Qdrant collection name for document vectors
    pub collection: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database: None,
            collection: "documents".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models: ModelsSettings::default(),
            endpoints: EndpointSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from file, creating defaults if it doesn't exist,
    /// then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut settings = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&contents).context("Failed to parse config file")?
        } else {
            let settings = Settings::default();
            settings.save()?;
            settings
        };

        if let Ok(url) = std::env::var(CHAT_URL_ENV) {
            settings.endpoints.chat_url = url;
        }
        if let Ok(path) = std::env::var(DATABASE_ENV) {
            settings.storage.database = Some(PathBuf::from(path));
        }

        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".docuchat").join("config.toml"))
    }

    /// Resolved database path, defaulting next to the config file
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.database {
            return Ok(path.clone());
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".docuchat").join("docuchat.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.models.default.is_none());
        assert_eq!(settings.endpoints.chat_url, "http://127.0.0.1:11434");
        assert_eq!(settings.storage.collection, "documents");
    }

    #[test]
    fn test_settings_toml_roundtrip() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.endpoints.embedding_model, "nomic-embed-text");
    }
}
