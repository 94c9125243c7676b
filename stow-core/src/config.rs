use crate::{Context, Error, Result};
use std::{env, time::Duration};

pub const CONNECTION_STRING_VAR: &str = "STOW_CONNECTION_STRING";
/// Seconds.
pub const COMMAND_TIMEOUT_VAR: &str = "STOW_COMMAND_TIMEOUT";

/// Settings of a [`DataService`](crate::DataService), passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Opaque to Stow, interpreted by the driver.
    pub connection_string: String,
    pub command_timeout: Duration,
    /// Multiplier applied to `command_timeout` for bulk transfers and merges.
    pub bulk_timeout_factor: u32,
}

impl Config {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            command_timeout: Duration::from_secs(30),
            bulk_timeout_factor: 3,
        }
    }

    /// Read `STOW_CONNECTION_STRING` and the optional `STOW_COMMAND_TIMEOUT`.
    pub fn from_env() -> Result<Self> {
        let connection_string = env::var(CONNECTION_STRING_VAR)
            .with_context(|| format!("Environment variable `{CONNECTION_STRING_VAR}` is not set"))?;
        let mut result = Self::new(connection_string);
        if let Ok(timeout) = env::var(COMMAND_TIMEOUT_VAR) {
            let seconds = timeout.trim().parse::<u64>().map_err(|e| {
                Error::new(e).context(format!(
                    "`{COMMAND_TIMEOUT_VAR}` must be a number of seconds, found `{timeout}`"
                ))
            })?;
            result.command_timeout = Duration::from_secs(seconds);
        }
        Ok(result)
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_bulk_timeout_factor(mut self, factor: u32) -> Self {
        self.bulk_timeout_factor = factor.max(1);
        self
    }

    pub fn bulk_timeout(&self) -> Duration {
        self.command_timeout.saturating_mul(self.bulk_timeout_factor)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("")
    }
}
