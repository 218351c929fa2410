//! SFTP Uploader Library
//!
//! Watches a local download directory and uploads every newly completed
//! file or directory to an SFTP server. Files are written under a
//! temporary name and renamed once complete, so the remote side never
//! sees a partial file.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod keys;
pub mod observability;
pub mod remote;
pub mod uploader;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
