//! Configuration settings and validation.

use crate::uploader::TransferConfig;
use crate::watcher::DEFAULT_QUIET_PERIOD;
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the uploader service.
#[derive(Debug, Clone)]
pub struct Config {
    /// SFTP server host name or address.
    pub host: String,

    /// SFTP server port.
    pub port: u16,

    /// Remote user name.
    pub user: String,

    /// Remote directory that uploads land in.
    pub remote_path: String,

    /// Suffix appended to in-flight remote file names.
    pub temp_extension: String,

    /// Maximum upload attempts per detected path.
    pub retry_count: u32,

    /// Seconds to wait between attempts.
    pub retry_delay_secs: u64,

    /// Local directory watched for completed downloads.
    pub watch_path: PathBuf,

    /// Seconds a path must stay quiet before it is uploaded.
    pub debounce_secs: u64,

    /// Directory holding the SSH keypair.
    pub key_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            user: String::new(),
            remote_path: "/uploads".to_string(),
            temp_extension: ".uploading".to_string(),
            retry_count: 3,
            retry_delay_secs: 30,
            watch_path: PathBuf::from("/downloads/complete"),
            debounce_secs: DEFAULT_QUIET_PERIOD.as_secs(),
            key_dir: PathBuf::from("/config/keys"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("SFTP_HOST is required"));
        }

        if self.user.trim().is_empty() {
            return Err(Error::config("SFTP_USER is required"));
        }

        if self.port == 0 {
            return Err(Error::config("port cannot be 0"));
        }

        if self.retry_count == 0 {
            return Err(Error::config("retry_count must be at least 1"));
        }

        // An empty suffix would make the temp name collide with the final name.
        if self.temp_extension.is_empty() {
            return Err(Error::config("temp_extension cannot be empty"));
        }

        if self.remote_path.is_empty() {
            return Err(Error::config("remote_path cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Quiet period applied by the debouncer.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    /// Human-readable upload target, `user@host:port/path`.
    #[must_use]
    pub fn target(&self) -> String {
        format!(
            "{}@{}:{}{}",
            self.user, self.host, self.port, self.remote_path
        )
    }

    /// Build the transfer settings handed to the uploader.
    #[must_use]
    pub fn transfer(&self, key_path: Option<PathBuf>) -> TransferConfig {
        TransferConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.user.clone(),
            key_path,
            remote_base: self.remote_path.clone(),
            temp_extension: self.temp_extension.clone(),
            retry_count: self.retry_count,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}
