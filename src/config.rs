//! Configuration management for the buffer engine
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling deployment tuning without recompilation. Table capacity and
//! queue depths can be adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    pub table: TableConfig,
    pub control: ControlConfig,
}

/// Buffer table parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Number of buffer slots, fixed for the table's lifetime
    pub capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Command pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Depth of the command intake ring
    pub command_queue_depth: usize,
    /// Depth of the outcome ring back to the control surface
    pub outcome_queue_depth: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            command_queue_depth: 256,
            outcome_queue_depth: 256,
        }
    }
}

impl Default for BankConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            table: TableConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

impl BankConfig {
    /// Load configuration from JSON file
    ///
    /// If the file doesn't exist or the JSON is invalid, logs a warning and
    /// returns the default config.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
