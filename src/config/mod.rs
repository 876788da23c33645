use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const APP_DIR: &str = "cir-tracker";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "cir-tracker.log";
const ENV_PREFIX: &str = "CIR_TRACKER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read environment: {0}")]
    Env(#[from] envy::Error),
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("no user configuration directory available; pass --settings")]
    NoConfigDir,
}

/// Process environment, read from `CIR_TRACKER_*` variables.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Path of the persisted settings file
    pub settings: Option<PathBuf>,
    /// Endpoint override for this session, never persisted
    pub endpoint: Option<String>,
    /// Tracing filter directives
    pub log: Option<String>,
    /// Where log lines are written while the terminal UI owns stdout
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is honored if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;
        Ok(config)
    }

    pub fn log_filter(&self) -> &str {
        self.log.as_deref().unwrap_or("info")
    }

    /// Log file from the environment, else the user state (or cache)
    /// directory, else the working directory.
    pub fn log_file(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .map(|dir| dir.join(APP_DIR).join(LOG_FILE))
            .unwrap_or_else(|| PathBuf::from(LOG_FILE))
    }

    /// Settings path from the environment, else the user config directory.
    pub fn settings_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.settings {
            Some(path) => Ok(path.clone()),
            None => default_settings_path(),
        }
    }
}

pub fn default_settings_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// User settings that survive restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Settings {
    /// Normalizes user input into an endpoint. Blank input means local mode.
    pub fn parse_endpoint(input: &str) -> Result<Option<String>, ConfigError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            url: trimmed.to_string(),
            reason,
        };
        let url = reqwest::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Some(trimmed.to_string())),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    pub fn is_local(&self) -> bool {
        self.endpoint.is_none()
    }
}

/// Reads and writes [`Settings`] as a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields default settings.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)?;

        info!(path = %self.path.display(), local = settings.is_local(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_local_mode() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = store.load().unwrap();
        assert!(settings.is_local());
    }

    #[test]
    fn save_then_load_keeps_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            endpoint: Some("https://example.org/api".into()),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"endpoint\""));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn endpoint_input_is_trimmed_and_validated() {
        assert_eq!(Settings::parse_endpoint("   ").unwrap(), None);
        assert_eq!(
            Settings::parse_endpoint(" https://script.example.com/exec ").unwrap(),
            Some("https://script.example.com/exec".to_string())
        );
        assert!(matches!(
            Settings::parse_endpoint("not a url"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            Settings::parse_endpoint("ftp://example.org"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "info");
        assert!(config.log_file().ends_with("cir-tracker.log"));

        let config = Config {
            log_file: Some(PathBuf::from("/tmp/elsewhere.log")),
            ..Config::default()
        };
        assert_eq!(config.log_file(), PathBuf::from("/tmp/elsewhere.log"));
    }
}
