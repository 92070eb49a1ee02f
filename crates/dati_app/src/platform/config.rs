use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dati_core::Settings;
use dati_engine::ClientSettings;
use dati_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "dati.ron";
const CONFIG_PATH_ENV: &str = "DATI_CONFIG";
const BASE_URL_ENV: &str = "DATI_BASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub(crate) enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_image_bytes: u64,
    pub recognize_max_polls: Option<u32>,
    pub log: LogTarget,
    pub log_level: String,
    /// ANSI bold for emphasized answer text.
    pub styled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            max_image_bytes: client.max_image_bytes,
            recognize_max_polls: None,
            log: LogTarget::File,
            log_level: "info".to_string(),
            styled: true,
        }
    }
}

impl AppConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_image_bytes: self.max_image_bytes,
        }
    }

    pub fn core_settings(&self) -> Settings {
        Settings {
            recognize_max_polls: self.recognize_max_polls,
        }
    }

    /// Unknown level names fall back to info.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }

    fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// A missing file is not an error.
pub(crate) fn load_from(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".").join(CONFIG_FILENAME))
}

/// Resolve the configuration; a broken file falls back to defaults and
/// hands the error back for logging once the logger is up.
pub(crate) fn load() -> (AppConfig, Option<ConfigError>) {
    let (config, error) = match load_from(&config_path()) {
        Ok(Some(config)) => (config, None),
        Ok(None) => (AppConfig::default(), None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    let config = config.with_base_url_override(std::env::var(BASE_URL_ENV).ok());
    (config, error)
}
