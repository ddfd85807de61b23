use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

pub const DEFAULT_MAP_URL: &str = "https://www.google.com/maps/embed?pb=!1m18!1m12!1m3!1d3610.1234567890!2d55.5136!3d25.4052!2m3!1f0!2f0!3f0!3m2!1i1024!2i768!4f13.1!3m3!1m2!1s0x3ef5f4334a67c47%3A0x1bb0f2d7c0b6b8a0!2sAjman%20Beach%2C%20UAE!5e0!3m2!1sen!2sus!4v1234567890124";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub startup_delay_ms: Option<u64>,
    pub itinerary_delay_ms: Option<u64>,
    pub follow_up_delay_ms: Option<u64>,
    pub pass_offer_delay_ms: Option<u64>,
    pub map_url: Option<String>,
    pub log_level: Option<String>,
}

/// Delays of the scripted chat, resolved from config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptTimings {
    pub startup: Duration,
    pub itinerary: Duration,
    pub follow_up: Duration,
    pub pass_offer: Duration,
}

impl Default for ScriptTimings {
    fn default() -> Self {
        Self {
            startup: Duration::from_millis(100),
            itinerary: Duration::from_millis(2000),
            follow_up: Duration::from_millis(1500),
            pass_offer: Duration::from_millis(500),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn timings(&self) -> ScriptTimings {
        let defaults = ScriptTimings::default();
        let ms = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };

        ScriptTimings {
            startup: ms(self.startup_delay_ms, defaults.startup),
            itinerary: ms(self.itinerary_delay_ms, defaults.itinerary),
            follow_up: ms(self.follow_up_delay_ms, defaults.follow_up),
            pass_offer: ms(self.pass_offer_delay_ms, defaults.pass_offer),
        }
    }

    pub fn map_url(&self) -> &str {
        self.map_url.as_deref().unwrap_or(DEFAULT_MAP_URL)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("transit-chat").join("config.json"))
    }

    /// Log file location; falls back to the temp dir when there is no cache dir
    pub fn log_path() -> PathBuf {
        let cache_dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        cache_dir.join("transit-chat").join("transit-chat.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.timings(), ScriptTimings::default());
        assert_eq!(config.map_url(), DEFAULT_MAP_URL);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "itinerary_delay_ms": 10, "log_level": "debug" }}"#).unwrap();

        let config = Config::load_from(file.path()).unwrap();
        let timings = config.timings();

        assert_eq!(timings.itinerary, Duration::from_millis(10));
        assert_eq!(timings.follow_up, Duration::from_millis(1500));
        assert_eq!(timings.pass_offer, Duration::from_millis(500));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }
}
