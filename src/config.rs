//! Session configuration, persisted as JSON.
//!
//! Looked up at `$TETHER_CONFIG`, falling back to
//! `$HOME/.config/tether/session.json`. A missing file means defaults.

use crate::error::SessionError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "TETHER_CONFIG";
const CONFIG_DIR: &str = ".config/tether";
const CONFIG_FILE: &str = "session.json";

/// Session settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Used to name the session's threads.
    pub application_name: String,
    /// Reported to the native library at login.
    pub user_agent: String,
    /// Relayed events buffered before the relay thread blocks.
    pub event_queue_capacity: usize,
    /// Longest a blocking wait sleeps before pumping again.
    pub max_pump_interval_ms: u64,
    /// Default limit for load waits.
    pub load_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            application_name: "tether".to_string(),
            user_agent: concat!("tether/", env!("CARGO_PKG_VERSION")).to_string(),
            event_queue_capacity: 64,
            max_pump_interval_ms: 5_000,
            load_timeout_secs: 10,
        }
    }
}

impl SessionConfig {
    /// Where the config lives unless told otherwise.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let config = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Self>(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, SessionError> {
        Self::load(&Self::default_path())
    }

    /// Save to config file
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.event_queue_capacity == 0 {
            return Err(SessionError::Config(
                "event_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_pump_interval_ms == 0 {
            return Err(SessionError::Config(
                "max_pump_interval_ms must be positive".to_string(),
            ));
        }
        if self.application_name.trim().is_empty() {
            return Err(SessionError::Config(
                "application_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn max_pump_interval(&self) -> Duration {
        Duration::from_millis(self.max_pump_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}
