//! Simulator configuration, loaded from TOML.
//!
//! ```toml
//! [simulator]
//! version = "1.1h"
//! build = "20190830"
//! tick_interval_ms = 10
//! debug = false
//!
//! [settings]
//! "20" = 1
//! "130" = 50.0
//! ```

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unknown setting '${0}'")]
    UnknownSetting(String),
    #[error("Invalid value {value} for setting '${key}'")]
    InvalidSetting { key: String, value: f64 },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Overrides applied on top of firmware defaults, keyed by setting index.
    #[serde(default)]
    pub settings: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_build")]
    pub build: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Log every line and its response at info level.
    #[serde(default)]
    pub debug: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            build: default_build(),
            tick_interval_ms: default_tick_interval_ms(),
            debug: false,
        }
    }
}

impl SimConfig {
    /// Firmware defaults with the `[settings]` overrides applied.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::new();
        for (key, value) in &self.settings {
            let index: u16 = key
                .trim_start_matches('$')
                .parse()
                .map_err(|_| ConfigError::UnknownSetting(key.clone()))?;
            if !Settings::is_known(index) {
                return Err(ConfigError::UnknownSetting(key.clone()));
            }
            settings
                .set(index, *value)
                .map_err(|_| ConfigError::InvalidSetting { key: key.clone(), value: *value })?;
        }
        Ok(settings)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulator.tick_interval_ms.max(1))
    }
}

fn default_version() -> String { "1.1h".to_string() }
fn default_build() -> String { "20190830".to_string() }
fn default_tick_interval_ms() -> u64 { 10 }

pub fn load_config(path: &str) -> Result<SimConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<SimConfig>(&contents) {
            Ok(config) => {
                // Surface bad setting overrides at load time rather than at construction.
                config.settings()?;
                Ok(config)
            }
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let config = SimConfig::default();
        assert_eq!(config.simulator.version, "1.1h");
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.settings().unwrap(), Settings::new());
    }

    #[test]
    fn loads_overrides_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[simulator]\ntick_interval_ms = 5\ndebug = true\n\n[settings]\n\"20\" = 1\n\"130\" = 50.0\n"
        )
        .unwrap();
        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert!(config.simulator.debug);
        assert_eq!(config.simulator.build, "20190830");
        let settings = config.settings().unwrap();
        assert!(settings.soft_limits_enabled());
        assert_eq!(settings.max_travel(crate::Axis::X), 50.0);
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[settings]\n\"99\" = 1\n").unwrap();
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSetting(ref k) if k == "99"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config("/nonexistent/grbl-sim.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
