//! SFTP Uploader - completed download mover
//!
//! Entry point for the uploader service.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sftp_uploader::keys::ensure_keypair;
use sftp_uploader::observability::{init_tracing, TracingConfig};
use sftp_uploader::remote::SftpConnector;
use sftp_uploader::uploader::PathUploader;
use sftp_uploader::watcher::{EventDebouncer, WatchLoop};
use sftp_uploader::{Config, Result};

/// SFTP Uploader - uploads completed downloads with atomic renames
#[derive(Parser, Debug)]
#[command(name = "sftp-uploader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SFTP server host
    #[arg(long, env = "SFTP_HOST")]
    host: Option<String>,

    /// SFTP server port
    #[arg(long, env = "SFTP_PORT", default_value = "22")]
    port: u16,

    /// Remote user name
    #[arg(long, env = "SFTP_USER")]
    user: Option<String>,

    /// Remote directory uploads are placed in
    #[arg(long, env = "SFTP_REMOTE_PATH", default_value = "/uploads")]
    remote_path: String,

    /// Suffix for files still being transferred
    #[arg(long, env = "SFTP_TEMP_EXTENSION", default_value = ".uploading")]
    temp_extension: String,

    /// Upload attempts per item
    #[arg(long, env = "SFTP_RETRY_COUNT", default_value = "3")]
    retry_count: u32,

    /// Seconds between attempts
    #[arg(long, env = "SFTP_RETRY_DELAY", default_value = "30")]
    retry_delay: u64,

    /// Directory to watch for completed downloads
    #[arg(short, long, env = "WATCH_PATH", default_value = "/downloads/complete")]
    watch_path: PathBuf,

    /// Seconds an item must stay quiet before upload
    #[arg(long, env = "DEBOUNCE_SECONDS", default_value = "10")]
    debounce: u64,

    /// Directory holding the SSH keypair
    #[arg(long, env = "KEY_DIR", default_value = "/config/keys")]
    key_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "UPLOADER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "UPLOADER_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    tracing::info!(
        "SFTP Uploader v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Runs before validation: the public key is logged even if SFTP_HOST is missing.
    let keys = ensure_keypair(&cli.key_dir)?;

    let config = Config {
        host: cli.host.unwrap_or_default(),
        port: cli.port,
        user: cli.user.unwrap_or_default(),
        remote_path: cli.remote_path,
        temp_extension: cli.temp_extension,
        retry_count: cli.retry_count,
        retry_delay_secs: cli.retry_delay,
        watch_path: cli.watch_path,
        debounce_secs: cli.debounce,
        key_dir: cli.key_dir,
        log_level: cli.log_level,
    };

    tracing::debug!(?config, "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        return Err(e);
    }

    tracing::info!("SFTP target: {}", config.target());

    let transfer = config.transfer(Some(keys.private));
    let connector = SftpConnector::new(&transfer);
    let uploader = Arc::new(PathUploader::new(transfer, connector));

    let debouncer = EventDebouncer::new(uploader, config.debounce());
    let watch = WatchLoop::start(&config.watch_path, debouncer)?;

    watch.run(shutdown_signal()).await?;

    tracing::info!("SFTP Uploader stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
