//! Configuration file
//!
//! ```json
//! { "data_file": "db-2x1.db", "log_events": true }
//! ```
//!
//! A relative `data_file` is resolved against the directory holding the
//! configuration file, not the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::storage::StoreOptions;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data file (required)
    pub data_file: PathBuf,

    /// Emit JSON log lines for store events (optional, default true)
    #[serde(default = "default_log_events")]
    pub log_events: bool,
}

fn default_log_events() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        if config.data_file.is_relative() {
            if let Some(dir) = path.parent() {
                config.data_file = dir.join(&config.data_file);
            }
        }

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(CliError::config_error("data_file must not be empty"));
        }
        Ok(())
    }

    /// Get the data file as Path
    pub fn data_path(&self) -> &Path {
        &self.data_file
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            log_events: self.log_events,
        }
    }
}
