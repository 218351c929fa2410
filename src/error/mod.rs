//! Error types and Result aliases for the uploader.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using the uploader's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for uploader operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Establishing an authenticated session failed.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A remote filesystem operation failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Keypair bootstrap error.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised while opening an SFTP session.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// TCP connection could not be established.
    #[error("failed to connect to {address}: {reason}")]
    Tcp { address: String, reason: String },

    /// SSH handshake failed.
    #[error("SSH handshake with {address} failed: {reason}")]
    Handshake { address: String, reason: String },

    /// Authentication was rejected.
    #[error("authentication failed for user '{user}': {reason}")]
    Auth { user: String, reason: String },

    /// The SFTP subsystem could not be started.
    #[error("SFTP subsystem unavailable: {0}")]
    Subsystem(String),
}

/// Errors from individual remote filesystem calls.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// `stat` failed for a reason other than the path being absent.
    #[error("stat '{path}' failed: {reason}")]
    Stat { path: String, reason: String },

    /// `mkdir` failed.
    #[error("mkdir '{path}' failed: {reason}")]
    Mkdir { path: String, reason: String },

    /// Content transfer failed.
    #[error("put '{local}' -> '{remote}' failed: {reason}")]
    Put {
        local: String,
        remote: String,
        reason: String,
    },

    /// Rename failed.
    #[error("rename '{from}' -> '{to}' failed: {reason}")]
    Rename {
        from: String,
        to: String,
        reason: String,
    },
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The event channel closed unexpectedly.
    #[error("event channel closed")]
    ChannelClosed,
}

/// Keypair bootstrap errors.
#[derive(Error, Debug)]
pub enum KeyError {
    /// Key generation failed.
    #[error("failed to generate keypair: {0}")]
    Generate(String),

    /// Key encoding or decoding failed.
    #[error("failed to encode key '{path}': {reason}")]
    Encode { path: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a fresh upload attempt may succeed where this one failed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Remote(_) | Self::Io(_))
    }
}

impl RemoteError {
    /// Create a put error.
    pub fn put(local: impl Into<String>, remote: impl Into<String>, reason: impl ToString) -> Self {
        Self::Put {
            local: local.into(),
            remote: remote.into(),
            reason: reason.to_string(),
        }
    }
}
