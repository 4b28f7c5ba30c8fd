// src/watch/source.rs

//! The `EventSource` trait and the bookkeeping shared by its backends.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{RelaunchError, Result};
use crate::fs::{FileKind, FileSystem};

/// Index of a target in its source's registration table.
pub type TargetId = usize;

/// One registered file plus the backend's handle for it.
///
/// The native descriptor itself stays inside the backend; `id` is the key
/// backends use to find it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub id: TargetId,
    pub path: PathBuf,
}

/// A single write-completion firing for a registered target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub target: TargetId,
    pub path: PathBuf,
}

/// A file change notification backend.
///
/// Implementations block the calling thread in [`EventSource::wait`]; the
/// watch loop drives them from a dedicated blocking thread.
pub trait EventSource: Send {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Start watching `path` for close-after-write.
    ///
    /// Fails with [`RelaunchError::NotRegularFile`] if `path` is not a plain
    /// file, or [`RelaunchError::WatchSetup`] if the metadata query or the
    /// native registration fails.
    fn register(&mut self, path: &Path) -> Result<WatchTarget>;

    /// Block until a registered target fires.
    ///
    /// Returns `Ok(None)` once the source can never fire again.
    fn wait(&mut self) -> Result<Option<WatchEvent>>;

    /// Targets registered so far, in registration order.
    fn targets(&self) -> &[WatchTarget];
}

/// Confirm `path` names a regular file and return its absolute form.
pub fn ensure_regular_file(fs: &dyn FileSystem, path: &Path) -> Result<PathBuf> {
    match fs.file_kind(path) {
        Ok(FileKind::Regular) => {}
        Ok(kind) => {
            debug!(path = %path.display(), ?kind, "refusing to watch non-regular file");
            return Err(RelaunchError::NotRegularFile {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(RelaunchError::watch_setup(path, &err)),
    }

    fs.absolute(path)
        .map_err(|err| RelaunchError::watch_setup(path, &err))
}

/// Registration table: target ids are dense indices in insertion order.
#[derive(Debug, Default)]
pub struct TargetTable {
    targets: Vec<WatchTarget>,
}

impl TargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted target will receive.
    pub fn next_id(&self) -> TargetId {
        self.targets.len()
    }

    pub fn insert(&mut self, path: PathBuf) -> WatchTarget {
        let target = WatchTarget {
            id: self.next_id(),
            path,
        };
        self.targets.push(target.clone());
        target
    }

    pub fn get(&self, id: TargetId) -> Option<&WatchTarget> {
        self.targets.get(id)
    }

    pub fn by_path(&self, path: &Path) -> Option<&WatchTarget> {
        self.targets.iter().find(|t| t.path == path)
    }

    pub fn event_for(&self, id: TargetId) -> Option<WatchEvent> {
        self.get(id).map(|t| WatchEvent {
            target: t.id,
            path: t.path.clone(),
        })
    }

    pub fn as_slice(&self) -> &[WatchTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
