//! Atomic, retrying uploads.
//!
//! This module provides:
//! - `TransferConfig`, the immutable transfer settings
//! - `PathUploader`, which uploads a file or directory tree using a
//!   temporary remote name followed by a rename

mod config;
mod transfer;

pub use config::TransferConfig;
pub use transfer::{ensure_remote_dir, PathUploader};
