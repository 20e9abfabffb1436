// User configuration: a JSON file under the platform config dir, written
// with defaults on first run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ledger-wide default currency.
    #[serde(default = "default_currency")]
    pub primary_currency: String,

    /// Day range for duplicate detection; null disables it.
    #[serde(default = "default_window")]
    pub duplicate_window: Option<i64>,

    /// Hints file applied to every csv, overriding per-directory pairing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<PathBuf>,

    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_window() -> Option<i64> {
    Some(5)
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8463
}

impl Default for Config {
    fn default() -> Self {
        Config {
            primary_currency: default_currency(),
            duplicate_window: default_window(),
            hints: None,
            hostname: default_hostname(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Default config path: `<config dir>/tallybook/config.json`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tallybook").join("config.json"))
}

impl Config {
    /// Load configuration.
    ///
    /// An explicitly named file must exist. With no path, the default
    /// location is read, or created with defaults on first run.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Missing(path.display().to_string()));
            }
            return Self::read(path);
        }

        let Some(path) = default_path() else {
            return Ok(Config::default());
        };
        if path.exists() {
            Self::read(&path)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    fn read(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Parse a duplicate-window argument: a day count, or `off` to disable.
pub fn parse_window(s: &str) -> Result<Option<i64>, ConfigError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    s.parse::<i64>()
        .map(Some)
        .map_err(|_| ConfigError::BadWindow(s.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
