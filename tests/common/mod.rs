//! In-memory remote filesystem shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sftp_uploader::error::{ConnectionError, RemoteError};
use sftp_uploader::remote::{self, Connector, PathState, RemoteFs};

/// One call made against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Connect,
    Stat(String),
    Mkdir(String),
    Put { local: PathBuf, remote: String },
    Rename { from: String, to: String },
    Close,
}

#[derive(Debug, Default)]
pub struct RemoteState {
    pub ops: Vec<RemoteOp>,
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    /// File sizes visible after every write step.
    pub listings: Vec<BTreeMap<String, usize>>,
    pub connect_failures: u32,
    pub put_failures: u32,
}

impl RemoteState {
    fn snapshot(&mut self) {
        let listing = self
            .files
            .iter()
            .map(|(name, data)| (name.clone(), data.len()))
            .collect();
        self.listings.push(listing);
    }
}

/// Connector handing out sessions over one shared [`RemoteState`].
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl MemoryRemote {
    /// A remote where only `dirs` exist.
    pub fn with_dirs(dirs: &[&str]) -> Self {
        let remote = Self::default();
        {
            let mut state = remote.state.lock();
            state.dirs.insert("/".to_string());
            state.dirs.extend(dirs.iter().map(ToString::to_string));
        }
        remote
    }

    pub fn fail_connects(&self, count: u32) {
        self.state.lock().connect_failures = count;
    }

    pub fn fail_puts(&self, count: u32) {
        self.state.lock().put_failures = count;
    }

    pub fn ops(&self) -> Vec<RemoteOp> {
        self.state.lock().ops.clone()
    }

    pub fn count(&self, op: &RemoteOp) -> usize {
        self.state.lock().ops.iter().filter(|o| *o == op).count()
    }

    pub fn mkdirs(&self) -> Vec<String> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                RemoteOp::Mkdir(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).cloned()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.state.lock().files.keys().cloned().collect()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.lock().dirs.contains(path)
    }

    pub fn listings(&self) -> Vec<BTreeMap<String, usize>> {
        self.state.lock().listings.clone()
    }
}

impl Connector for MemoryRemote {
    type Session = MemorySession;

    fn connect(&self) -> Result<MemorySession, ConnectionError> {
        let mut state = self.state.lock();
        state.ops.push(RemoteOp::Connect);
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(ConnectionError::Tcp {
                address: "memory:22".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(MemorySession {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MemorySession {
    state: Arc<Mutex<RemoteState>>,
}

impl RemoteFs for MemorySession {
    fn stat(&mut self, path: &str) -> Result<PathState, RemoteError> {
        let mut state = self.state.lock();
        state.ops.push(RemoteOp::Stat(path.to_string()));
        if state.dirs.contains(path) || state.files.contains_key(path) {
            Ok(PathState::Present)
        } else {
            Ok(PathState::Missing)
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock();
        state.ops.push(RemoteOp::Mkdir(path.to_string()));
        if !state.dirs.insert(path.to_string()) {
            return Err(RemoteError::Mkdir {
                path: path.to_string(),
                reason: "already exists".to_string(),
            });
        }
        Ok(())
    }

    fn put(&mut self, local: &Path, remote_path: &str) -> Result<(), RemoteError> {
        let content = std::fs::read(local)
            .map_err(|e| RemoteError::put(local.display().to_string(), remote_path, e))?;

        let mut state = self.state.lock();
        state.ops.push(RemoteOp::Put {
            local: local.to_path_buf(),
            remote: remote_path.to_string(),
        });

        let parent_exists = remote::parent(remote_path).map_or(true, |p| state.dirs.contains(p));
        if !parent_exists {
            return Err(RemoteError::put(
                local.display().to_string(),
                remote_path,
                "no such directory",
            ));
        }

        // Written in two halves so partial states show up in the listings.
        let half = content.len() / 2;
        state
            .files
            .insert(remote_path.to_string(), content[..half].to_vec());
        state.snapshot();

        if state.put_failures > 0 {
            state.put_failures -= 1;
            return Err(RemoteError::put(
                local.display().to_string(),
                remote_path,
                "connection reset",
            ));
        }

        state.files.insert(remote_path.to_string(), content);
        state.snapshot();
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock();
        state.ops.push(RemoteOp::Rename {
            from: from.to_string(),
            to: to.to_string(),
        });
        let Some(content) = state.files.remove(from) else {
            return Err(RemoteError::Rename {
                from: from.to_string(),
                to: to.to_string(),
                reason: "no such file".to_string(),
            });
        };
        state.files.insert(to.to_string(), content);
        state.snapshot();
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().ops.push(RemoteOp::Close);
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}
