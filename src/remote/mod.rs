//! Remote filesystem capability.
//!
//! The uploader only needs a handful of operations from the far side:
//! connect, stat, mkdir, put, rename and close. They are expressed as the
//! [`Connector`] and [`RemoteFs`] traits so the transfer logic can run
//! against SFTP in production and an in-memory fake in tests.

mod sftp;

use std::path::{Path, PathBuf};

use crate::error::{ConnectionError, RemoteError};

pub use sftp::{SftpConnector, SftpSession};

/// Result of a remote `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    /// Something exists at the path.
    Present,
    /// The server reported that nothing exists at the path.
    Missing,
}

/// Operations performed over one authenticated session.
pub trait RemoteFs {
    /// Check whether `path` exists.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than "no such file".
    fn stat(&mut self, path: &str) -> Result<PathState, RemoteError>;

    /// Create a single directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory could not be created, including
    /// when it already exists.
    fn mkdir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Copy the content of a local file to `remote`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    fn put(&mut self, local: &Path, remote: &str) -> Result<(), RemoteError>;

    /// Rename `from` to `to` in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the rename.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), RemoteError>;

    /// Tear the session down. Never fails; errors are logged.
    fn close(&mut self);
}

/// Opens sessions against the remote server.
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: RemoteFs;

    /// Open a new authenticated session.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or rejects the login.
    fn connect(&self) -> Result<Self::Session, ConnectionError>;
}

/// How the client proves who it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A private key file on disk.
    KeyFile(PathBuf),
    /// Whatever the running SSH agent offers.
    Agent,
}

impl Identity {
    /// Pick the key file if it is usable, otherwise fall back to the agent.
    #[must_use]
    pub fn resolve(key_path: Option<&Path>) -> Self {
        match key_path {
            Some(path) if path.is_file() && std::fs::File::open(path).is_ok() => {
                Self::KeyFile(path.to_path_buf())
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "Private key unusable, using SSH agent");
                Self::Agent
            }
            None => Self::Agent,
        }
    }
}

/// Join a remote directory and an entry name with a single `/`.
#[must_use]
pub fn join(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

/// Parent of a remote path, or `None` at the top.
#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}
