//! Configuration management
//!
//! Settings live in `settings.json` inside the taskdeck directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8080", "timeoutSecs": 30 },
//!   "health": { "intervalSecs": 30 }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::Error;

/// Environment variable overriding the configured API base URL
pub const API_URL_ENV: &str = "TASKDECK_API_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    health: HealthSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Taskdeck configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL, without trailing slash
    pub base_url: String,
    pub timeout: Duration,
    pub health_interval: Duration,
    /// Set when `base_url` came from the environment and must not be saved
    base_url_from_env: bool,
    /// URL from the settings file, written back untouched on save
    file_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            health_interval: Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
            base_url_from_env: false,
            file_base_url: None,
        }
    }
}

impl Config {
    /// Load config from the taskdeck directory
    ///
    /// The base URL can be overridden with `TASKDECK_API_URL`.
    pub fn load(taskdeck_dir: &Path) -> Result<Self> {
        Self::load_with_override(taskdeck_dir, std::env::var(API_URL_ENV).ok())
    }

    fn load_with_override(taskdeck_dir: &Path, env_url: Option<String>) -> Result<Self> {
        let raw = read_settings(taskdeck_dir)?;

        let file_base_url = raw.api.base_url.clone();
        let (base_url, base_url_from_env) = match env_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => (normalize_base_url(&url)?, true),
            None => match &file_base_url {
                Some(url) => (normalize_base_url(url)?, false),
                None => (DEFAULT_BASE_URL.to_string(), false),
            },
        };

        let timeout_secs = raw.api.timeout_secs.filter(|s| *s > 0).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let interval_secs = raw
            .health
            .interval_secs
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_HEALTH_INTERVAL_SECS);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            health_interval: Duration::from_secs(interval_secs),
            base_url_from_env,
            file_base_url,
        })
    }

    /// Save config to the taskdeck directory
    ///
    /// Preserves settings this crate doesn't manage. An environment override
    /// of the base URL is never written.
    pub fn save(&self, taskdeck_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(taskdeck_dir)?;
        let mut settings = read_settings(taskdeck_dir)?;

        settings.api.base_url = if self.base_url_from_env {
            self.file_base_url.clone()
        } else {
            Some(self.base_url.clone())
        };
        settings.api.timeout_secs = Some(self.timeout.as_secs());
        settings.health.interval_secs = Some(self.health_interval.as_secs());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(taskdeck_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Change the API base URL after validating it
    pub fn set_base_url(&mut self, url: &str) -> std::result::Result<(), Error> {
        self.base_url = normalize_base_url(url)?;
        self.base_url_from_env = false;
        Ok(())
    }

    /// Whether the base URL currently comes from `TASKDECK_API_URL`
    pub fn base_url_from_env(&self) -> bool {
        self.base_url_from_env
    }
}

fn read_settings(taskdeck_dir: &Path) -> Result<SettingsFile> {
    let settings_path = taskdeck_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

/// Check that `raw` is an absolute http(s) URL and drop trailing slashes
pub fn normalize_base_url(raw: &str) -> std::result::Result<String, Error> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Invalid API URL '{}': scheme must be http or https",
            trimmed
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::Config(format!("Invalid API URL '{}': missing host", trimmed)));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_with_override(dir.path(), None).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.health_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_reads_settings_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"api": {"baseUrl": "https://tasks.example.com/", "timeoutSecs": 5}, "health": {"intervalSecs": 10}}"#,
        )
        .unwrap();

        let config = Config::load_with_override(dir.path(), None).unwrap();

        assert_eq!(config.base_url, "https://tasks.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.health_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_env_override_wins_and_is_not_saved() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"api": {"baseUrl": "http://file.example.com"}}"#,
        )
        .unwrap();

        let config =
            Config::load_with_override(dir.path(), Some("http://env.example.com".to_string())).unwrap();
        assert_eq!(config.base_url, "http://env.example.com");
        assert!(config.base_url_from_env());

        config.save(dir.path()).unwrap();
        let reloaded = Config::load_with_override(dir.path(), None).unwrap();
        assert_eq!(reloaded.base_url, "http://file.example.com");
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": "dark", "api": {"baseUrl": "http://a.example.com", "retries": 3}}"#,
        )
        .unwrap();

        let mut config = Config::load_with_override(dir.path(), None).unwrap();
        config.set_base_url("http://b.example.com/").unwrap();
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["api"]["retries"], 3);
        assert_eq!(json["api"]["baseUrl"], "http://b.example.com");
    }

    #[test]
    fn test_invalid_urls_rejected() {
        assert!(matches!(normalize_base_url("not a url"), Err(Error::Config(_))));
        assert!(matches!(normalize_base_url("ftp://example.com"), Err(Error::Config(_))));

        let mut config = Config::default();
        assert!(config.set_base_url("localhost:8080").is_err());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_url_in_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), r#"{"api": {"baseUrl": "::nope"}}"#).unwrap();

        assert!(Config::load_with_override(dir.path(), None).is_err());
    }
}
