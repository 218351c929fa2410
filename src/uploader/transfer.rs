//! Retrying, atomic upload of a single top-level path.

use std::path::Path;

use walkdir::WalkDir;

use super::TransferConfig;
use crate::remote::{self, Connector, PathState, RemoteFs};
use crate::watcher::UploadHandler;
use crate::{Error, Result};

/// Uploads files and directory trees with temp-name-then-rename semantics.
///
/// Holds no state between calls beyond its configuration; concurrent
/// uploads of different paths each open their own session.
pub struct PathUploader<C> {
    config: TransferConfig,
    connector: C,
}

impl<C: Connector> PathUploader<C> {
    /// Create an uploader.
    #[must_use]
    pub const fn new(config: TransferConfig, connector: C) -> Self {
        Self { config, connector }
    }

    /// Transfer settings in use.
    #[must_use]
    pub const fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Upload `local` (file or directory) under the remote base path.
    ///
    /// Makes up to `retry_count` attempts, sleeping `retry_delay` between
    /// them. Any failure ends only the current attempt. Errors are logged,
    /// never returned. Blocks the calling thread.
    pub fn upload(&self, local: &Path) -> bool {
        if !local.exists() {
            tracing::warn!(path = %local.display(), "Path no longer exists, skipping upload");
            return false;
        }

        let total = self.config.retry_count.max(1);
        for attempt in 1..=total {
            match self.attempt(local) {
                Ok(()) => {
                    tracing::info!(path = %local.display(), attempt, "Upload complete");
                    return true;
                }
                Err(e) => {
                    tracing::error!(
                        path = %local.display(),
                        attempt,
                        total,
                        retryable = e.is_retryable(),
                        "Attempt {attempt}/{total} failed: {e}"
                    );
                    if attempt < total && !self.config.retry_delay.is_zero() {
                        std::thread::sleep(self.config.retry_delay);
                    }
                }
            }
        }

        tracing::error!(
            "Upload failed after {total} attempts: {}",
            local.display()
        );
        false
    }

    /// One connection, one full transfer, always closed afterwards.
    fn attempt(&self, local: &Path) -> Result<()> {
        let mut session = self.connector.connect()?;
        let result = self.transfer(&mut session, local);
        session.close();
        result
    }

    fn transfer<S: RemoteFs>(&self, fs: &mut S, local: &Path) -> Result<()> {
        let base = self.config.remote_base.as_str();
        if local.is_dir() {
            self.upload_dir(fs, local, base)
        } else if local.is_file() {
            self.upload_file(fs, local, base)
        } else {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("'{}' is neither a file nor a directory", local.display()),
            )))
        }
    }

    /// Upload one file into `remote_base` via its temp name.
    ///
    /// # Errors
    ///
    /// Returns an error if the put or the rename fails.
    pub fn upload_file<S: RemoteFs>(
        &self,
        fs: &mut S,
        local: &Path,
        remote_base: &str,
    ) -> Result<()> {
        let name = file_name(local)?;
        let (final_path, temp_path) = self.config.target_paths(remote_base, &name);

        ensure_remote_dir(fs, remote_base);

        tracing::info!("Uploading {} -> {temp_path}", local.display());
        fs.put(local, &temp_path)?;

        tracing::info!("Renaming {temp_path} -> {final_path}");
        fs.rename(&temp_path, &final_path)?;

        Ok(())
    }

    /// Recreate `local` as `remote_base/<name>` and upload its contents depth-first.
    ///
    /// # Errors
    ///
    /// Returns an error if listing the local directory or any contained
    /// upload fails.
    pub fn upload_dir<S: RemoteFs>(
        &self,
        fs: &mut S,
        local: &Path,
        remote_base: &str,
    ) -> Result<()> {
        let remote_dir = remote::join(remote_base, &file_name(local)?);
        ensure_remote_dir(fs, &remote_dir);

        let entries = WalkDir::new(local)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if path.is_file() {
                self.upload_file(fs, path, &remote_dir)?;
            } else if path.is_dir() {
                self.upload_dir(fs, path, &remote_dir)?;
            } else {
                tracing::debug!(path = %path.display(), "Skipping special file");
            }
        }

        Ok(())
    }
}

impl<C: Connector + 'static> UploadHandler for PathUploader<C> {
    fn upload(&self, path: &Path) -> bool {
        Self::upload(self, path)
    }
}

/// Create `path` and any missing ancestors, shallowest first.
///
/// Only a "no such file" stat answer counts as missing; any other stat
/// error stops the walk as if the directory existed. Creation errors are
/// ignored since another client may have created the directory first.
pub fn ensure_remote_dir<S: RemoteFs + ?Sized>(fs: &mut S, path: &str) {
    let mut missing = Vec::new();
    let mut current = Some(path);

    while let Some(dir) = current.filter(|d| !d.is_empty()) {
        match fs.stat(dir) {
            Ok(PathState::Missing) => {
                missing.push(dir.to_string());
                current = remote::parent(dir);
            }
            Ok(PathState::Present) => break,
            Err(e) => {
                tracing::debug!("Treating '{dir}' as existing after stat error: {e}");
                break;
            }
        }
    }

    for dir in missing.iter().rev() {
        if let Err(e) = fs.mkdir(dir) {
            tracing::debug!("Ignoring mkdir failure: {e}");
        }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::internal(format!("path has no file name: {}", path.display())))
}
