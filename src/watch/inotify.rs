// src/watch/inotify.rs

//! Persistent backend on Linux: inotify through `notify::INotifyWatcher`.
//!
//! One watch per file lives for the lifetime of the source. Only
//! `IN_CLOSE_WRITE` (surfaced by `notify` as
//! `Access(Close(Write))`) counts as a firing; every other event kind is
//! dropped here.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use notify::event::{AccessKind, AccessMode};
use notify::{Config, Event, EventKind, INotifyWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace};

use crate::errors::{RelaunchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::source::{
    EventSource, TargetTable, WatchEvent, WatchTarget, ensure_regular_file,
};

pub struct InotifySource {
    watcher: INotifyWatcher,
    events: Receiver<notify::Result<Event>>,
    table: TargetTable,
    pending: VecDeque<WatchEvent>,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for InotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InotifySource")
            .field("targets", &self.table)
            .finish_non_exhaustive()
    }
}

impl InotifySource {
    pub fn new() -> Result<Self> {
        Self::with_fs(Arc::new(RealFileSystem))
    }

    pub fn with_fs(fs: Arc<dyn FileSystem>) -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let watcher = INotifyWatcher::new(tx, Config::default()).map_err(|err| {
            RelaunchError::BackendInit {
                backend: "inotify",
                code: notify_os_code(&err),
                message: err.to_string(),
            }
        })?;

        Ok(Self {
            watcher,
            events,
            table: TargetTable::new(),
            pending: VecDeque::new(),
            fs,
        })
    }
}

impl EventSource for InotifySource {
    fn name(&self) -> &'static str {
        "inotify"
    }

    fn register(&mut self, path: &Path) -> Result<WatchTarget> {
        let abs = ensure_regular_file(self.fs.as_ref(), path)?;

        self.watcher
            .watch(&abs, RecursiveMode::NonRecursive)
            .map_err(|err| RelaunchError::WatchSetup {
                path: path.to_path_buf(),
                code: notify_os_code(&err),
                message: err.to_string(),
            })?;

        let target = self.table.insert(abs);
        debug!(id = target.id, path = %target.path.display(), "inotify watch added");
        Ok(target)
    }

    fn wait(&mut self) -> Result<Option<WatchEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            // The sender lives inside `self.watcher`, so a closed channel
            // means the backend thread died.
            let event = self
                .events
                .recv()
                .map_err(|_| RelaunchError::Wait {
                    code: None,
                    message: "inotify event thread stopped".to_string(),
                })?
                .map_err(|err| RelaunchError::Wait {
                    code: notify_os_code(&err),
                    message: err.to_string(),
                })?;

            if !is_close_write(&event.kind) {
                trace!(kind = ?event.kind, "ignoring inotify event");
                continue;
            }

            for path in event.paths {
                match self.table.by_path(&path) {
                    Some(target) => self.pending.push_back(WatchEvent {
                        target: target.id,
                        path,
                    }),
                    None => debug!(path = %path.display(), "close-write on unregistered path"),
                }
            }
        }
    }

    fn targets(&self) -> &[WatchTarget] {
        self.table.as_slice()
    }
}

fn is_close_write(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Access(AccessKind::Close(AccessMode::Write)))
}

fn notify_os_code(err: &notify::Error) -> Option<i32> {
    match &err.kind {
        notify::ErrorKind::Io(io) => io.raw_os_error(),
        notify::ErrorKind::PathNotFound => Some(nix::errno::Errno::ENOENT as i32),
        notify::ErrorKind::MaxFilesWatch => Some(nix::errno::Errno::ENOSPC as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::ModifyKind;

    #[test]
    fn only_close_write_counts() {
        assert!(is_close_write(&EventKind::Access(AccessKind::Close(
            AccessMode::Write
        ))));
        assert!(!is_close_write(&EventKind::Access(AccessKind::Close(
            AccessMode::Read
        ))));
        assert!(!is_close_write(&EventKind::Modify(ModifyKind::Any)));
    }

    #[test]
    fn io_errors_keep_their_code() {
        let err = notify::Error::io(std::io::Error::from_raw_os_error(13));
        assert_eq!(notify_os_code(&err), Some(13));
        assert_eq!(notify_os_code(&notify::Error::path_not_found()), Some(2));
    }
}
