use crate::core::error::{Error, Result};
use crate::utils::get_config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

/// Settings for `pfrule check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Warn about private, loopback and other reserved addresses
    #[serde(default = "default_true")]
    pub warn_reserved_addresses: bool,
    /// Treat `20:10` style ranges as errors instead of warnings
    #[serde(default)]
    pub reject_inverted_ranges: bool,
    /// Log level used when no `-v` flag is given
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            warn_reserved_addresses: true,
            reject_inverted_ranges: false,
            log_level: default_log_level(),
        }
    }
}

impl CheckConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: CheckConfig = serde_json::from_str(text)?;
        config.level()?;
        Ok(config)
    }

    /// Parsed `log_level`.
    pub fn level(&self) -> Result<Level> {
        Level::from_str(&self.log_level)
            .map_err(|_| Error::Config(format!("unknown log level '{}'", self.log_level)))
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// `config.json` inside the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.json"))
}

/// Loads the checker configuration.
///
/// An explicit `path` must exist. Without one, the default location is
/// tried and a missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<CheckConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(CheckConfig::default()),
        },
    };

    let text = std::fs::read_to_string(&path)?;
    CheckConfig::from_json(&text)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}
