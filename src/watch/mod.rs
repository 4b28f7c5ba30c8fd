// src/watch/mod.rs

//! File change notification.
//!
//! This module turns "a watched file was closed after being written" into
//! [`WatchEvent`]s behind the [`EventSource`] trait:
//! - [`inotify`]: persistent watches (Linux).
//! - [`kqueue`]: one-shot vnode watches (macOS / BSD).
//! - [`memory`]: in-memory source for tests.
//!
//! The native backend is picked at build time by [`native_source`].
//!
//! It does **not** know about processes; the watch loop forwards firings to
//! the supervisor.

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod inotify;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub mod kqueue;
pub mod memory;
pub mod source;

pub use memory::{MemorySource, MemoryTrigger};
pub use source::{EventSource, TargetId, WatchEvent, WatchTarget};

use crate::errors::Result;
use crate::types::OneShotPolicy;

/// Build the notification backend for the current platform.
///
/// `policy` only matters for the one-shot backend.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn native_source(_policy: OneShotPolicy) -> Result<Box<dyn EventSource>> {
    Ok(Box::new(inotify::InotifySource::new()?))
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub fn native_source(policy: OneShotPolicy) -> Result<Box<dyn EventSource>> {
    Ok(Box::new(kqueue::KqueueSource::new(policy)?))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
pub fn native_source(_policy: OneShotPolicy) -> Result<Box<dyn EventSource>> {
    Err(crate::errors::RelaunchError::BackendInit {
        backend: "native",
        code: None,
        message: "no inotify or kqueue on this platform".to_string(),
    })
}
