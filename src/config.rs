use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MailError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Provider label to ingest from
    #[serde(default = "default_label")]
    pub label: String,
    /// Default batch bound for a run
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Page size for listing requests
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            max_results: default_max_results(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Completion model id
    #[serde(default = "default_model")]
    pub model: String,
    /// Response cap for completion calls
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address the HTTP surface binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_label() -> String {
    "SENT".to_string()
}

fn default_max_results() -> usize {
    50
}

fn default_page_size() -> u32 {
    100
}

fn default_store_path() -> PathBuf {
    PathBuf::from("emails.db")
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u16 {
    500
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| MailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sync.label.trim().is_empty() {
            return Err(MailError::ConfigError(
                "sync.label must not be empty".to_string(),
            ));
        }
        if self.sync.max_results == 0 {
            return Err(MailError::ConfigError(
                "sync.max_results must be at least 1".to_string(),
            ));
        }

        // The provider caps listing pages at 500 ids
        if self.sync.page_size == 0 || self.sync.page_size > 500 {
            return Err(MailError::ConfigError(
                "sync.page_size must be between 1 and 500".to_string(),
            ));
        }

        if self.model.model.trim().is_empty() {
            return Err(MailError::ConfigError(
                "model.model must not be empty".to_string(),
            ));
        }
        if self.model.max_tokens == 0 {
            return Err(MailError::ConfigError(
                "model.max_tokens must be at least 1".to_string(),
            ));
        }

        if self.api.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(MailError::ConfigError(format!(
                "api.bind is not a valid socket address: '{}'",
                self.api.bind
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/jobmail.toml"))
            .await
            .unwrap();
        assert_eq!(config.sync.label, "SENT");
        assert_eq!(config.sync.max_results, 50);
        assert_eq!(config.api.bind, "127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[sync]\nmax_results = 200\n")
            .await
            .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.sync.max_results, 200);
        assert_eq!(config.sync.page_size, 100);
        assert_eq!(config.model.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[sync]\npage_size = 5000\n")
            .await
            .unwrap();

        let result = Config::load(&path).await;
        assert!(matches!(result, Err(MailError::ConfigError(_))));
    }

    #[test]
    fn test_bind_address_validated() {
        let mut config = Config::default();
        config.api.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }
}
