// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration and on-disk layout

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the config directory (tests, portable
/// installs).
pub const CONFIG_DIR_ENV: &str = "DRIFT_CONFIG_DIR";

/// Errors that can occur loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a config directory")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings.toml: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Optional knobs read from `settings.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// tracing env-filter directive, e.g. `drift=debug`
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Frontend event channel capacity
    #[serde(default)]
    pub bus_capacity: Option<usize>,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Resolve the config directory, create it if needed, and read
    /// `settings.toml` when present.
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join("drift"),
        };
        Self::load_from(config_dir)
    }

    pub fn load_from(config_dir: PathBuf) -> Result<Self, ConfigError> {
        std::fs::create_dir_all(&config_dir)?;
        let log_dir = config_dir.join("logs");
        std::fs::create_dir_all(&log_dir)?;

        let settings_path = config_dir.join("settings.toml");
        let settings = match std::fs::read_to_string(&settings_path) {
            Ok(raw) => toml::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            config_dir,
            log_dir,
            settings,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join("driftd.log")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
