//! Configuration Management
//!
//! Where the Services endpoint lives and how long to wait for it. Stored as
//! JSON under the user's config directory; the library itself never reads
//! it implicitly, callers load it and pass it to [`Services::new`](crate::Services::new).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("drupal-services/{}", env!("CARGO_PKG_VERSION"))
}

/// Connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Site root, e.g. `http://localhost/drupal`
    #[serde(default)]
    pub drupal_instance: String,
    /// Services endpoint path, e.g. `/api/v1`
    #[serde(default)]
    pub api_endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            drupal_instance: "http://localhost".to_string(),
            api_endpoint: "/api".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("drupal-services").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write config {:?}", path))?;

        Ok(())
    }

    /// `drupal_instance` + `api_endpoint`, joined with a single slash
    pub fn base_url(&self) -> String {
        let instance = self.drupal_instance.trim_end_matches('/');
        let endpoint = self.api_endpoint.trim_matches('/');
        if endpoint.is_empty() {
            instance.to_string()
        } else {
            format!("{}/{}", instance, endpoint)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the base URL is an absolute http(s) URL and the timeout is usable
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url();
        let url = url::Url::parse(&base).with_context(|| format!("Invalid instance URL: {}", base))?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported URL scheme '{}', expected http or https", url.scheme());
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("Timeout must be at least one second");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_joins_with_single_slash() {
        let config = ApiConfig {
            drupal_instance: "http://example.com/drupal/".to_string(),
            api_endpoint: "/api/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://example.com/drupal/api/v1");
    }

    #[test]
    fn test_empty_endpoint() {
        let config = ApiConfig {
            api_endpoint: String::new(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost");
    }

    #[test]
    fn test_validate() {
        assert!(ApiConfig::default().validate().is_ok());

        let relative = ApiConfig {
            drupal_instance: "localhost".to_string(),
            ..Default::default()
        };
        assert!(relative.validate().is_err());

        let ftp = ApiConfig {
            drupal_instance: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(ftp.validate().is_err());

        let no_timeout = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = ApiConfig {
            drupal_instance: "https://cms.example.org".to_string(),
            api_endpoint: "/rest".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(ApiConfig::load_from(&path), config);
    }

    #[test]
    fn test_missing_or_broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(ApiConfig::load_from(&path), ApiConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ApiConfig::load_from(&path), ApiConfig::default());
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"drupal_instance": "http://cms", "api_endpoint": "/api"}"#).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.user_agent.starts_with("drupal-services/"));
    }
}
