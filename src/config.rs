use crate::stats::StatsOptions;
use crate::stats::bucket::HourFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::UtcOffset;
use time::macros::format_description;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub store: Option<StoreSection>,
    #[serde(default)]
    pub stats: Option<StatsSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSection {
    /// JSON snapshot with slots and records to seed the store from
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsSection {
    /// Local offset such as "+08:00" (default: UTC)
    pub utc_offset: Option<String>,
    /// "24h" or "12h" (default: 24h)
    pub hour_format: Option<HourFormat>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        let path = self.store.as_ref()?.snapshot_path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.logging
            .level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("logging.level = {:?}", self.logging.level)))
    }

    pub fn utc_offset(&self) -> Result<UtcOffset, ConfigError> {
        let Some(raw) = self.stats.as_ref().and_then(|s| s.utc_offset.as_deref()) else {
            return Ok(UtcOffset::UTC);
        };
        UtcOffset::parse(
            raw.trim(),
            format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
        )
        .map_err(|err| ConfigError::Invalid(format!("stats.utc_offset = {raw:?}: {err}")))
    }

    pub fn hour_format(&self) -> HourFormat {
        self.stats
            .as_ref()
            .and_then(|s| s.hour_format)
            .unwrap_or_default()
    }

    pub fn stats_options(&self) -> Result<StatsOptions, ConfigError> {
        Ok(StatsOptions {
            utc_offset: self.utc_offset()?,
            hour_format: self.hour_format(),
        })
    }
}
