//! Per-path debounce of creation events.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Default quiet period before a detected path is uploaded.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(10);

/// Receives settled paths. Called on a blocking worker thread.
pub trait UploadHandler: Send + Sync + 'static {
    /// Upload `path`, returning whether it succeeded.
    fn upload(&self, path: &Path) -> bool;
}

/// Statistics for debounced uploads.
#[derive(Debug, Default)]
pub struct DebouncerStats {
    pub paths_detected: AtomicU64,
    pub uploads_started: AtomicU64,
    pub paths_vanished: AtomicU64,
    pub uploads_succeeded: AtomicU64,
    pub uploads_failed: AtomicU64,
}

impl DebouncerStats {
    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> DebouncerStatsSnapshot {
        DebouncerStatsSnapshot {
            paths_detected: self.paths_detected.load(Ordering::Relaxed),
            uploads_started: self.uploads_started.load(Ordering::Relaxed),
            paths_vanished: self.paths_vanished.load(Ordering::Relaxed),
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of debouncer stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncerStatsSnapshot {
    pub paths_detected: u64,
    pub uploads_started: u64,
    pub paths_vanished: u64,
    pub uploads_succeeded: u64,
    pub uploads_failed: u64,
}

/// A path waiting for its quiet period to elapse.
struct PendingUpload {
    generation: u64,
    timer: JoinHandle<()>,
}

struct Shared<H> {
    quiet_period: Duration,
    handler: Arc<H>,
    pending: Mutex<HashMap<PathBuf, PendingUpload>>,
    next_generation: AtomicU64,
    stats: DebouncerStats,
}

/// Collapses bursts of events per path into one upload.
///
/// Each notified path gets a timer task. A further event for the same path
/// aborts that timer and arms a fresh one, so a path is only handed to the
/// [`UploadHandler`] once it has been quiet for the full period. Cloning
/// yields another handle to the same pending map.
pub struct EventDebouncer<H> {
    shared: Arc<Shared<H>>,
}

impl<H> Clone for EventDebouncer<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H: UploadHandler> EventDebouncer<H> {
    /// Create a debouncer that hands settled paths to `handler`.
    #[must_use]
    pub fn new(handler: Arc<H>, quiet_period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                quiet_period,
                handler,
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                stats: DebouncerStats::default(),
            }),
        }
    }

    /// Arm (or re-arm) the timer for `path`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn notify(&self, path: PathBuf) {
        self.shared
            .stats
            .paths_detected
            .fetch_add(1, Ordering::Relaxed);

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        let key = path.clone();

        let mut pending = self.shared.pending.lock();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(shared.quiet_period).await;
            Shared::fire(shared, key, generation).await;
        });

        if let Some(previous) = pending.insert(path, PendingUpload { generation, timer }) {
            previous.timer.abort();
            tracing::debug!(generation, "Rescheduled pending upload");
        }
    }

    /// Cancel every timer that has not fired yet.
    ///
    /// Uploads already running are left alone. Returns the number of
    /// cancelled timers.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<_> = self.shared.pending.lock().drain().collect();
        for (path, entry) in &drained {
            entry.timer.abort();
            tracing::debug!(path = %path.display(), "Cancelled pending upload");
        }
        drained.len()
    }

    /// Number of paths waiting for their quiet period.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Whether `path` currently has an armed timer.
    #[must_use]
    pub fn is_pending(&self, path: &Path) -> bool {
        self.shared.pending.lock().contains_key(path)
    }

    /// Quiet period applied to every path.
    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        self.shared.quiet_period
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn stats(&self) -> DebouncerStatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl<H: UploadHandler> Shared<H> {
    async fn fire(this: Arc<Self>, path: PathBuf, generation: u64) {
        {
            let mut pending = this.pending.lock();
            let current = matches!(pending.get(&path), Some(entry) if entry.generation == generation);
            if !current {
                // Superseded by a later event between the sleep and the lock.
                return;
            }
            pending.remove(&path);
        }

        if !path.exists() {
            this.stats.paths_vanished.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %path.display(), "Path vanished before upload, skipping");
            return;
        }

        this.stats.uploads_started.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Starting upload: {}", path.display());

        let handler = Arc::clone(&this.handler);
        let upload_path = path.clone();
        match tokio::task::spawn_blocking(move || handler.upload(&upload_path)).await {
            Ok(true) => {
                this.stats.uploads_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                this.stats.uploads_failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                this.stats.uploads_failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(path = %path.display(), "Upload worker failed: {e}");
            }
        }
    }
}
