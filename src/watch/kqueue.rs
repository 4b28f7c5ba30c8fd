// src/watch/kqueue.rs

//! One-shot backend on macOS and the BSDs: kqueue `EVFILT_VNODE` with
//! `NOTE_WRITE` and `EV_ONESHOT`.
//!
//! Each registration is consumed by its first firing. Under
//! [`OneShotPolicy::Rearm`] the target is re-added before the event is handed
//! out; under [`OneShotPolicy::Once`] it stays disarmed, and `wait` returns
//! `None` once nothing is armed.

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::event::{EventFilter, EventFlag, FilterFlag, KEvent, Kqueue};
use tracing::{debug, trace};

use crate::errors::{RelaunchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::OneShotPolicy;
use crate::watch::source::{
    EventSource, TargetId, TargetTable, WatchEvent, WatchTarget, ensure_regular_file,
};

/// Open descriptor backing one target. Closing it removes the kevent.
#[derive(Debug)]
struct VnodeWatch {
    file: File,
    armed: bool,
}

pub struct KqueueSource {
    kq: Kqueue,
    policy: OneShotPolicy,
    table: TargetTable,
    watches: Vec<VnodeWatch>,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for KqueueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KqueueSource")
            .field("policy", &self.policy)
            .field("targets", &self.table)
            .finish_non_exhaustive()
    }
}

impl KqueueSource {
    pub fn new(policy: OneShotPolicy) -> Result<Self> {
        Self::with_fs(policy, Arc::new(RealFileSystem))
    }

    pub fn with_fs(policy: OneShotPolicy, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let kq = Kqueue::new().map_err(|errno| RelaunchError::BackendInit {
            backend: "kqueue",
            code: Some(errno as i32),
            message: errno.desc().to_string(),
        })?;

        Ok(Self {
            kq,
            policy,
            table: TargetTable::new(),
            watches: Vec::new(),
            fs,
        })
    }

    fn arm(&self, id: TargetId, file: &File) -> std::result::Result<(), Errno> {
        let change = KEvent::new(
            file.as_raw_fd() as usize,
            EventFilter::EVFILT_VNODE,
            EventFlag::EV_ADD | EventFlag::EV_ONESHOT,
            FilterFlag::NOTE_WRITE,
            0,
            id as isize,
        );
        self.kq.kevent(&[change], &mut [], None).map(|_| ())
    }

    fn any_armed(&self) -> bool {
        self.watches.iter().any(|w| w.armed)
    }
}

impl EventSource for KqueueSource {
    fn name(&self) -> &'static str {
        "kqueue"
    }

    fn register(&mut self, path: &Path) -> Result<WatchTarget> {
        let abs = ensure_regular_file(self.fs.as_ref(), path)?;
        let file = File::open(&abs).map_err(|err| RelaunchError::watch_setup(path, &err))?;

        let id = self.table.next_id();
        self.arm(id, &file)
            .map_err(|errno| RelaunchError::watch_setup(path, &io::Error::from(errno)))?;

        self.watches.push(VnodeWatch { file, armed: true });
        let target = self.table.insert(abs);
        debug!(id = target.id, path = %target.path.display(), "kqueue vnode watch added");
        Ok(target)
    }

    fn wait(&mut self) -> Result<Option<WatchEvent>> {
        loop {
            if !self.any_armed() {
                debug!("every one-shot target has fired; kqueue source exhausted");
                return Ok(None);
            }

            let mut fired = [KEvent::new(
                0,
                EventFilter::EVFILT_VNODE,
                EventFlag::empty(),
                FilterFlag::empty(),
                0,
                0,
            )];

            let n = match self.kq.kevent(&[], &mut fired, None) {
                Ok(n) => n,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(RelaunchError::wait(&io::Error::from(errno))),
            };
            if n == 0 {
                continue;
            }

            let ev = &fired[0];
            if ev.flags().contains(EventFlag::EV_ERROR) {
                let code = ev.data() as i32;
                return Err(RelaunchError::wait(&io::Error::from_raw_os_error(code)));
            }

            let id = ev.udata() as TargetId;
            let Some(event) = self.table.event_for(id) else {
                trace!(id, "kevent for unknown target");
                continue;
            };

            match self.policy {
                OneShotPolicy::Rearm => {
                    let file = &self.watches[id].file;
                    self.arm(id, file)
                        .map_err(|errno| RelaunchError::wait(&io::Error::from(errno)))?;
                }
                OneShotPolicy::Once => {
                    self.watches[id].armed = false;
                }
            }

            return Ok(Some(event));
        }
    }

    fn targets(&self) -> &[WatchTarget] {
        self.table.as_slice()
    }
}
