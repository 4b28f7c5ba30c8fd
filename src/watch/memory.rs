// src/watch/memory.rs

//! In-memory event source for tests.
//!
//! Registration consults a [`FileSystem`] (usually a
//! [`MockFileSystem`](crate::fs::mock::MockFileSystem)); firings are injected
//! through a cloneable [`MemoryTrigger`]. When every trigger has been dropped
//! and the queue is drained, `wait` returns `None`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

use crate::errors::{RelaunchError, Result};
use crate::fs::FileSystem;
use crate::types::OneShotPolicy;
use crate::watch::source::{
    EventSource, TargetTable, WatchEvent, WatchTarget, ensure_regular_file,
};

#[derive(Debug)]
enum Injected {
    WriteClosed(PathBuf),
    Fail(i32),
}

/// Handle used by tests to simulate file activity.
#[derive(Debug, Clone)]
pub struct MemoryTrigger {
    tx: Sender<Injected>,
}

impl MemoryTrigger {
    /// Simulate a file at `path` being closed after a write.
    ///
    /// Returns false if the source has been dropped.
    pub fn write_closed(&self, path: impl Into<PathBuf>) -> bool {
        self.tx.send(Injected::WriteClosed(path.into())).is_ok()
    }

    /// Make the next `wait` fail with the given OS error code.
    pub fn fail(&self, code: i32) -> bool {
        self.tx.send(Injected::Fail(code)).is_ok()
    }
}

#[derive(Debug)]
pub struct MemorySource {
    fs: Arc<dyn FileSystem>,
    rx: Receiver<Injected>,
    table: TargetTable,
    /// `None` behaves like inotify; `Some` emulates kqueue's one-shot rules.
    one_shot: Option<OneShotPolicy>,
    armed: Vec<bool>,
}

impl MemorySource {
    pub fn new(fs: Arc<dyn FileSystem>) -> (Self, MemoryTrigger) {
        let (tx, rx) = mpsc::channel();
        let source = Self {
            fs,
            rx,
            table: TargetTable::new(),
            one_shot: None,
            armed: Vec::new(),
        };
        (source, MemoryTrigger { tx })
    }

    pub fn one_shot(mut self, policy: OneShotPolicy) -> Self {
        self.one_shot = Some(policy);
        self
    }
}

impl EventSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn register(&mut self, path: &Path) -> Result<WatchTarget> {
        let abs = ensure_regular_file(self.fs.as_ref(), path)?;
        self.armed.push(true);
        Ok(self.table.insert(abs))
    }

    fn wait(&mut self) -> Result<Option<WatchEvent>> {
        loop {
            if self.one_shot.is_some() && !self.armed.iter().any(|a| *a) {
                return Ok(None);
            }

            let injected = match self.rx.recv() {
                Ok(injected) => injected,
                Err(_) => return Ok(None),
            };

            let path = match injected {
                Injected::WriteClosed(path) => path,
                Injected::Fail(code) => {
                    return Err(RelaunchError::wait(&std::io::Error::from_raw_os_error(
                        code,
                    )));
                }
            };

            let Some(target) = self.table.by_path(&path) else {
                trace!(path = %path.display(), "write on unwatched path");
                continue;
            };
            let id = target.id;

            if !self.armed[id] {
                trace!(id, "one-shot target already consumed");
                continue;
            }
            if self.one_shot == Some(OneShotPolicy::Once) {
                self.armed[id] = false;
            }

            return Ok(self.table.event_for(id));
        }
    }

    fn targets(&self) -> &[WatchTarget] {
        self.table.as_slice()
    }
}
