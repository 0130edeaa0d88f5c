use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/forum_chat.json";
pub const DEFAULT_API_BASE_URL: &str = "https://db-api.alpha-panda.eu/api/v1";
/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "FORUM_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub session_db_path: String,
    /// Distance from the bottom, in points, that still counts as "at bottom".
    pub scroll_bottom_threshold: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: 3_000,
            request_timeout_secs: 15,
            session_db_path: "data/session.db".to_string(),
            scroll_bottom_threshold: 64.0,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic.
        Duration::from_millis(self.poll_interval_ms.max(250))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn apply_env(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            log::info!("Using API base URL from {API_URL_ENV}: {url}");
            self.api_base_url = url.trim().to_string();
        }
        self
    }
}

/// Load config from `path`, falling back to defaults, then apply env overrides.
pub fn load_config(path: &str) -> AppConfig {
    read_config_file(path).apply_env(std::env::var(API_URL_ENV).ok())
}

fn read_config_file(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> crate::error::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            read_config_file(path.to_str().unwrap()),
            AppConfig::default()
        );
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "poll_interval_ms": 5000 }"#).unwrap();

        let config = read_config_file(path.to_str().unwrap());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(
            read_config_file(path.to_str().unwrap()),
            AppConfig::default()
        );
    }

    #[test]
    fn saved_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");
        let path = path.to_str().unwrap();

        let config = AppConfig {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            ..AppConfig::default()
        };
        save_config(path, &config).unwrap();
        assert_eq!(read_config_file(path), config);
    }

    #[test]
    fn env_override_replaces_base_url() {
        let config = AppConfig::default().apply_env(Some(" http://example.test ".to_string()));
        assert_eq!(config.api_base_url, "http://example.test");

        let untouched = AppConfig::default().apply_env(Some("   ".to_string()));
        assert_eq!(untouched.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let config = AppConfig {
            poll_interval_ms: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }
}
