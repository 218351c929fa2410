//! Configuration management for the uploader.
//!
//! Values come from command-line arguments or, more commonly, the
//! environment (`SFTP_*`, `WATCH_PATH`, `KEY_DIR`, ...). Parsing happens
//! in `main.rs`; this module holds the validated result.

mod settings;

pub use settings::Config;
