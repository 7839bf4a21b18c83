//! Optional `ledger.toml` living next to the ledger database.
//!
//! A missing file is not an error; every field has a default.

use crate::core::error::LedgerError;
use crate::core::schemas;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_DEVICE: &str = "default";
pub const DEFAULT_STARTING_CREDITS: u64 = 100;
pub const DEFAULT_ACTOR: &str = "ledger";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Device name; selects the profile and feature keys.
    pub device: String,
    /// Credits granted to a freshly created profile.
    pub starting_credits: u64,
    /// Actor name recorded in the audit log.
    pub actor: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            starting_credits: DEFAULT_STARTING_CREDITS,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn profile_key(&self) -> String {
        format!("{}{}", PROFILE_KEY_PREFIX, self.device)
    }

    pub fn features_key(&self) -> String {
        format!("features:{}", self.device)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        let re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$")
            .map_err(|e| LedgerError::ConfigError(e.to_string()))?;
        if !re.is_match(&self.device) {
            return Err(LedgerError::ConfigError(format!(
                "invalid device name '{}': use letters, digits, '.', '_' or '-'",
                self.device
            )));
        }
        if self.actor.trim().is_empty() {
            return Err(LedgerError::ConfigError("actor must not be empty".to_string()));
        }
        Ok(())
    }
}

pub const PROFILE_KEY_PREFIX: &str = "profile:";

/// Load `ledger.toml` from the store root, falling back to defaults.
pub fn load_config(store_root: &Path) -> Result<LedgerConfig, LedgerError> {
    let config_path = store_root.join(schemas::CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(LedgerConfig::default());
    }
    let content = fs::read_to_string(&config_path)?;
    let config: LedgerConfig =
        toml::from_str(&content).map_err(|e| LedgerError::ConfigError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Write a config file unless one already exists. Returns whether it wrote.
pub fn write_default_config(store_root: &Path) -> Result<bool, LedgerError> {
    let config_path = store_root.join(schemas::CONFIG_FILE_NAME);
    if config_path.exists() {
        return Ok(false);
    }
    let body = toml::to_string_pretty(&LedgerConfig::default())
        .map_err(|e| LedgerError::ConfigError(e.to_string()))?;
    fs::write(&config_path, body)?;
    Ok(true)
}
