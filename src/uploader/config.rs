//! Transfer settings.

use std::path::PathBuf;
use std::time::Duration;

/// Settings consumed by [`super::PathUploader`]. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// SFTP server host.
    pub host: String,
    /// SFTP server port.
    pub port: u16,
    /// Remote user name.
    pub username: String,
    /// Private key, if one is available.
    pub key_path: Option<PathBuf>,
    /// Remote directory uploads are placed under.
    pub remote_base: String,
    /// Suffix for in-flight remote files.
    pub temp_extension: String,
    /// Attempts per upload, at least 1.
    pub retry_count: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            key_path: None,
            remote_base: "/uploads".to_string(),
            temp_extension: ".uploading".to_string(),
            retry_count: 3,
            retry_delay: Duration::from_secs(30),
        }
    }
}

impl TransferConfig {
    /// Final and in-flight remote names for `name` under `remote_dir`.
    #[must_use]
    pub fn target_paths(&self, remote_dir: &str, name: &str) -> (String, String) {
        let final_path = crate::remote::join(remote_dir, name);
        let temp_path = format!("{final_path}{}", self.temp_extension);
        (final_path, temp_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.port, 22);
        assert_eq!(config.remote_base, "/uploads");
        assert_eq!(config.temp_extension, ".uploading");
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(30));
        assert!(config.key_path.is_none());
    }

    #[test]
    fn test_target_paths() {
        let config = TransferConfig {
            temp_extension: ".part".to_string(),
            ..Default::default()
        };
        let (final_path, temp_path) = config.target_paths("/uploads/show", "ep01.mkv");
        assert_eq!(final_path, "/uploads/show/ep01.mkv");
        assert_eq!(temp_path, "/uploads/show/ep01.mkv.part");
    }
}
