//! Configuration management for MovieStream
//!
//! Handles config file loading and override resolution.
//! Config is stored at ~/.config/moviestream/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::playback::PlayerType;

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const API_URL_ENV: &str = "MOVIESTREAM_API_URL";
pub const STORAGE_ENV: &str = "MOVIESTREAM_STORAGE";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root URL, without the `/api` suffix
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Pause before retrying a failed read
    pub retry_backoff_ms: u64,
    /// Watch-state file; defaults to the data dir
    pub storage_path: Option<PathBuf>,
    /// Preferred local player
    pub player: PlayerType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 10,
            retry_backoff_ms: 500,
            storage_path: None,
            player: PlayerType::default(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/moviestream/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("moviestream").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load config from a file. Missing file means defaults; a malformed
    /// file is logged and also means defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                Self::default()
            }
        }
    }

    /// Apply overrides with precedence:
    /// 1. Command-line flag
    /// 2. Environment variable
    /// 3. Config file (already loaded)
    pub fn apply_overrides(&mut self, api_url: Option<String>, storage: Option<PathBuf>) {
        if let Some(url) = api_url.or_else(|| env_value(API_URL_ENV)) {
            self.api_url = url;
        }
        if let Some(path) = storage.or_else(|| env_value(STORAGE_ENV).map(PathBuf::from)) {
            self.storage_path = Some(path);
        }
    }

    /// Watch-state file to open, if any location is known
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(crate::storage::FileStore::default_path)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.retry_backoff_ms, 500);
        assert_eq!(config.player, PlayerType::Mpv);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(r#"api_url = "http://media:9000""#).unwrap();
        assert_eq!(config.api_url, "http://media:9000");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "player = \"vlc\"\nretry_backoff_ms = 50\n").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.player, PlayerType::Vlc);
        assert_eq!(config.retry_backoff_ms, 50);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(Config::load_from(&dir.path().join("missing.toml")), Config::default());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = [").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_flag_beats_file() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://flag:1".into()), Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(config.api_url, "http://flag:1");
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/s.json")));
    }
}
