use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use reel_core::preview::DEFAULT_PROXY_BASE;
use reel_engine::{BackendSettings, DEFAULT_BACKEND_URL};
use reel_logging::{LogDestination, LOG_FILE_NAME};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory unless a path is given on the
/// command line.
pub(crate) const CONFIG_FILE_NAME: &str = "fetch_reel.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum LogTarget {
    File,
    #[default]
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

/// Settings read from `fetch_reel.ron`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub backend_url: String,
    pub proxy_base: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub log_destination: LogTarget,
    /// Used when `log_destination` is `File` or `Both`.
    pub log_file: PathBuf,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            connect_timeout_ms: backend.connect_timeout.as_millis() as u64,
            request_timeout_ms: backend.request_timeout.as_millis() as u64,
            log_destination: LogTarget::default(),
            log_file: PathBuf::from(LOG_FILE_NAME),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Unknown level names fall back to `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.backend_url.clone(),
            connect_timeout: self.connect_timeout(),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("no configuration at {0:?}")]
    Missing(PathBuf),
    #[error("failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Reads the configuration file. Runs before logging is set up, so the
/// caller reports the error once the logger exists.
pub(crate) fn read(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        Err(err) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Like [`read`], but any failure yields the defaults.
pub(crate) fn read_or_default(path: &Path) -> (AppConfig, Option<ConfigError>) {
    match read(path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}
