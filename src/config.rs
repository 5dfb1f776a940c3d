//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri dei tool
//! - Fornisce validazione dei parametri
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Applica gli override da variabili d'ambiente (`LOVE_PUBLIC_KEY`, `ILOVEIMG_API_URL`)
//!
//! ## Parametri di configurazione:
//! - `love_public_key`: Chiave pubblica iLoveImg (default: None)
//! - `api_base_url`: Base URL API iLoveImg (default: "https://api.iloveimg.com")
//! - `poll_max_attempts`: Tentativi massimi di polling (default: 30)
//! - `poll_interval_secs`: Pausa fra i tentativi (default: 2)
//! - `auth_timeout_secs`: Timeout auth e status check (default: 10)
//! - `transfer_timeout_secs`: Timeout upload, creazione task e download (default: 30)
//! - `max_frame_count`: Numero massimo di frame estraibili (default: 100)
//! - `frame_quality`: Qualità JPEG ffmpeg `-q:v` (1-31, default: 2)
//! - `show_progress`: Progress bar su stderr (default: true)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config::from_file(&Config::default_path()).await?.with_env_overrides();
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::iloveimg::PollPolicy;

pub const PUBLIC_KEY_ENV: &str = "LOVE_PUBLIC_KEY";
pub const API_URL_ENV: &str = "ILOVEIMG_API_URL";
pub const DEFAULT_API_BASE_URL: &str = "https://api.iloveimg.com";

/// Configuration for the media tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// iLoveImg public key
    pub love_public_key: Option<String>,
    /// iLoveImg API base URL
    pub api_base_url: String,
    /// Maximum number of task status checks
    pub poll_max_attempts: u32,
    /// Pause between task status checks, in seconds
    pub poll_interval_secs: u64,
    /// Timeout for auth and task status requests, in seconds
    pub auth_timeout_secs: u64,
    /// Timeout for upload, task creation and download requests, in seconds
    pub transfer_timeout_secs: u64,
    /// Upper bound for the frame list tool
    pub max_frame_count: u32,
    /// ffmpeg `-q:v` value for extracted JPEG frames (1 = best)
    pub frame_quality: u8,
    /// Draw progress bars on stderr
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            love_public_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_max_attempts: 30,
            poll_interval_secs: 2,
            auth_timeout_secs: 10,
            transfer_timeout_secs: 30,
            max_frame_count: 100,
            frame_quality: 2,
            show_progress: true,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "API base URL must start with http:// or https://: {}",
                self.api_base_url
            ));
        }

        if self.poll_max_attempts == 0 {
            return Err(anyhow::anyhow!("Poll max attempts must be greater than 0"));
        }

        if self.auth_timeout_secs == 0 || self.transfer_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeouts must be greater than 0"));
        }

        if self.max_frame_count == 0 || self.max_frame_count > 1000 {
            return Err(anyhow::anyhow!("Max frame count must be between 1 and 1000"));
        }

        if self.frame_quality == 0 || self.frame_quality > 31 {
            return Err(anyhow::anyhow!("Frame quality must be between 1 and 31"));
        }

        Ok(())
    }

    /// Apply `LOVE_PUBLIC_KEY` and `ILOVEIMG_API_URL` from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(PUBLIC_KEY_ENV) {
            if !key.trim().is_empty() {
                self.love_public_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }

    /// The configured credential, if any
    pub fn public_key(&self) -> Option<&str> {
        self.love_public_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.poll_max_attempts,
            interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    /// Default config location: `<config_dir>/media-tools/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-tools").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.poll_max_attempts = 0;
        assert!(config.validate().is_err());

        config.poll_max_attempts = 30;
        config.frame_quality = 32;
        assert!(config.validate().is_err());

        config.frame_quality = 2;
        config.api_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://api.iloveimg.com");
        assert_eq!(config.poll_max_attempts, 30);
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.auth_timeout_secs, 10);
        assert_eq!(config.transfer_timeout_secs, 30);
        assert_eq!(config.max_frame_count, 100);
        assert!(config.public_key().is_none());

        let policy = config.poll_policy();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(policy.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_blank_public_key_is_absent() {
        let config = Config {
            love_public_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.public_key().is_none());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            love_public_key: Some("PK123".to_string()),
            poll_max_attempts: 5,
            poll_interval_secs: 1,
            show_progress: false,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.public_key(), Some("PK123"));
        assert_eq!(loaded_config.poll_max_attempts, 5);
        assert_eq!(loaded_config.poll_interval_secs, 1);
        assert!(!loaded_config.show_progress);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.poll_max_attempts, 30);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"poll_max_attempts": 7}"#).await.unwrap();

        let config = Config::from_file(&path).await.unwrap();
        assert_eq!(config.poll_max_attempts, 7);
        assert_eq!(config.transfer_timeout_secs, 30);
    }
}
