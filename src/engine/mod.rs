// src/engine/mod.rs

//! The watch loop.
//!
//! This module ties together:
//! - the event source (file-change firings, running on its own thread)
//! - the supervisor (what runs in response)
//! - shutdown signals
//!
//! The pure decision logic lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::errors::RelaunchError;
use crate::watch::WatchEvent;

/// Events flowing into the loop from the event source thread and signals.
#[derive(Debug)]
pub enum LoopEvent {
    /// A watched file was closed after a write.
    Fired(WatchEvent),
    /// `EventSource::wait` failed; the source thread has stopped.
    SourceFailed(RelaunchError),
    /// The source can never fire again (watch-once targets all consumed).
    SourceExhausted,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Why the loop stopped without an error. All of these exit with status 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A change fired while the command was empty.
    EmptyCommand,
    /// Ctrl-C or another shutdown request.
    Shutdown,
    /// Nothing left to watch.
    SourceExhausted,
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreStep, LoopCore, LoopPhase, StepOutcome};
pub use self::runtime::WatchLoop;
