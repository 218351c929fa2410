//! Directory watch loop using notify-rs.

use std::future::Future;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::debouncer::{EventDebouncer, UploadHandler};
use super::events::{created_paths, is_top_level};
use crate::error::WatcherError;
use crate::Result;

/// Capacity of the channel between the notify thread and the loop.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Watches one directory and feeds new top-level entries (created or moved in) to the
/// debouncer.
pub struct WatchLoop<H> {
    root: PathBuf,
    debouncer: EventDebouncer<H>,
    watcher: RecommendedWatcher,
    event_rx: mpsc::Receiver<PathBuf>,
}

impl<H: UploadHandler> WatchLoop<H> {
    /// Create the watch root if needed and subscribe to it.
    ///
    /// The subscription is live when this returns; anything created
    /// afterwards is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or watched.
    pub fn start(root: impl AsRef<Path>, debouncer: EventDebouncer<H>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for path in created_paths(event) {
                        if event_tx.blocking_send(path).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            quiet_secs = debouncer.quiet_period().as_secs(),
            "Watching {} for completed downloads...",
            root.display()
        );

        Ok(Self {
            root,
            debouncer,
            watcher,
            event_rx,
        })
    }

    /// Canonical watch root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dispatch events until `shutdown` completes.
    ///
    /// On shutdown the subscription is dropped and the event channel drained
    /// until the notify thread has released it, then every pending debounce
    /// timer is cancelled. Uploads already running are not awaited.
    ///
    /// # Errors
    ///
    /// Returns an error if the notify thread stops delivering events on its
    /// own.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            root,
            debouncer,
            watcher,
            mut event_rx,
        } = self;
        tokio::pin!(shutdown);

        let closed = loop {
            tokio::select! {
                () = &mut shutdown => break false,
                received = event_rx.recv() => match received {
                    Some(path) => dispatch(&root, &debouncer, path),
                    None => break true,
                },
            }
        };

        drop(watcher);
        let mut discarded = 0usize;
        while event_rx.recv().await.is_some() {
            discarded += 1;
        }

        let cancelled = debouncer.shutdown();
        tracing::info!(cancelled, discarded, "Stopped watching {}", root.display());

        if closed {
            return Err(WatcherError::ChannelClosed.into());
        }
        Ok(())
    }
}

fn dispatch<H: UploadHandler>(root: &Path, debouncer: &EventDebouncer<H>, path: PathBuf) {
    if !is_top_level(root, &path) {
        tracing::debug!(path = %path.display(), "Ignoring nested event");
        return;
    }

    tracing::info!("Detected: {}", path.display());
    debouncer.notify(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct NoopHandler;

    impl UploadHandler for NoopHandler {
        fn upload(&self, _path: &Path) -> bool {
            true
        }
    }

    fn debouncer() -> EventDebouncer<NoopHandler> {
        EventDebouncer::new(Arc::new(NoopHandler), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_start_creates_missing_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("downloads").join("complete");

        let watch = WatchLoop::start(&root, debouncer()).unwrap();

        assert!(root.is_dir());
        assert_eq!(watch.root(), root.canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_filters_nested_paths() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let debouncer = debouncer();

        dispatch(&root, &debouncer, root.join("show").join("ep01.mkv"));
        assert_eq!(debouncer.pending_count(), 0);

        dispatch(&root, &debouncer, root.join("show"));
        assert!(debouncer.is_pending(&root.join("show")));

        debouncer.shutdown();
    }

    #[tokio::test]
    async fn test_run_returns_on_shutdown() {
        let tmp = TempDir::new().unwrap();
        let debouncer = debouncer();
        let watch = WatchLoop::start(tmp.path(), debouncer.clone()).unwrap();

        watch.run(std::future::ready(())).await.unwrap();
        assert_eq!(debouncer.pending_count(), 0);
    }
}
