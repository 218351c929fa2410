//! File system watching and upload scheduling.
//!
//! This module provides:
//! - Non-recursive directory watching using notify-rs
//! - Per-path debouncing so an item is uploaded once it stops changing

mod debouncer;
mod events;
mod watch_loop;

pub use debouncer::{
    DebouncerStats, DebouncerStatsSnapshot, EventDebouncer, UploadHandler, DEFAULT_QUIET_PERIOD,
};
pub use events::{created_paths, is_top_level};
pub use watch_loop::WatchLoop;
