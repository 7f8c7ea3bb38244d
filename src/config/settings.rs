//! Application settings loading from a TOML file.
//!
//! Every field has a default, so the settings file is optional. The database
//! URL can be overridden with the `DATABASE_URL` environment variable (a `.env`
//! file is honoured by the binary).

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default settings file looked up by [`load_default_settings`]
pub const DEFAULT_SETTINGS_PATH: &str = "chit.toml";

/// Runtime settings for the auction engine and its scheduler
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Database connection URL
    pub database_url: String,
    /// Seconds between scheduler ticks
    pub tick_interval_secs: u64,
    /// Upper bound for a single open/close transaction
    pub transaction_timeout_secs: u64,
    /// Capacity of the notification broadcast buffer
    pub event_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            tick_interval_secs: 60,
            transaction_timeout_secs: 30,
            event_buffer: 256,
        }
    }
}

impl Settings {
    /// Scheduler tick interval
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Per-transition transaction budget
    #[must_use]
    pub const fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_secs)
    }

    /// Rejects zero intervals, zero timeouts and an empty broadcast buffer.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            return Err(Error::Config {
                message: "tick_interval_secs must be greater than zero".to_string(),
            });
        }
        if self.transaction_timeout_secs == 0 {
            return Err(Error::Config {
                message: "transaction_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.event_buffer == 0 {
            return Err(Error::Config {
                message: "event_buffer must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        self
    }
}

/// Parses settings from TOML text and validates them.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from a TOML file, then applies environment overrides.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails validation
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref())?;

    Ok(parse_settings(&contents)?.apply_env_overrides())
}

/// Loads `./chit.toml` if present, otherwise defaults; environment overrides apply either way.
pub fn load_default_settings() -> Result<Settings> {
    if Path::new(DEFAULT_SETTINGS_PATH).exists() {
        load_settings(DEFAULT_SETTINGS_PATH)
    } else {
        tracing::debug!("No {DEFAULT_SETTINGS_PATH} found, using default settings");
        Ok(Settings::default().apply_env_overrides())
    }
}
