use anyhow::{anyhow, Context, Result};
use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use emu_gamecube::{DeviceKind, PORT_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device plugged into each port
    pub ports: [DeviceKind; PORT_COUNT],
    /// Attach a rumble actuator to the controllers
    pub rumble: bool,
    /// Global log level name ("off", "warn", "debug", ...)
    pub log_level: String,
    /// Per-category overrides, category name -> level name
    pub categories: HashMap<String, String>,
    /// Maximum log lines per second per category
    pub rate_limit: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ports: [
                DeviceKind::StandardController,
                DeviceKind::Dummy,
                DeviceKind::Dummy,
                DeviceKind::Dummy,
            ],
            rumble: true,
            log_level: "warn".to_string(),
            categories: HashMap::new(),
            rate_limit: 60,
            log_file: None,
        }
    }
}

impl Config {
    /// Load a config file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Configure `log` from the level names in this config
    pub fn apply_logging(&self, log: &LogConfig) -> Result<()> {
        let global = LogLevel::from_str(&self.log_level)
            .ok_or_else(|| anyhow!("unknown log level '{}'", self.log_level))?;
        log.set_global_level(global);

        for (name, level) in &self.categories {
            let category = LogCategory::from_str(name)
                .ok_or_else(|| anyhow!("unknown log category '{}'", name))?;
            let level = LogLevel::from_str(level)
                .ok_or_else(|| anyhow!("unknown log level '{}' for '{}'", level, name))?;
            log.set_level(category, level);
        }

        log.set_rate_limit(self.rate_limit);

        if let Some(path) = &self.log_file {
            log.set_log_file(path.clone())
                .with_context(|| format!("opening log file {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.ports[0], DeviceKind::StandardController);
        assert!(config.ports[1..].iter().all(|&k| k == DeviceKind::Dummy));
        assert!(config.rumble);
        assert_eq!(config.rate_limit, 60);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = serde_json::from_str(
            r#"{ "ports": ["dummy", "standard_controller", "dummy", "standard_controller"],
                 "categories": { "si": "trace" } }"#,
        )
        .unwrap();
        assert_eq!(config.ports[3], DeviceKind::StandardController);
        assert_eq!(config.log_level, "warn");

        let log = LogConfig::new();
        config.apply_logging(&log).unwrap();
        assert_eq!(log.get_global_level(), LogLevel::Warn);
        assert_eq!(log.get_level(LogCategory::SerialInterface), LogLevel::Trace);
    }

    #[test]
    fn test_bad_level_rejected() {
        let config = Config {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.apply_logging(&LogConfig::new()).is_err());

        let mut config = Config::default();
        config
            .categories
            .insert("ppu".to_string(), "debug".to_string());
        assert!(config.apply_logging(&LogConfig::new()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/si-trace.json");
        assert!(Config::load(Some(path)).is_err());
    }
}
