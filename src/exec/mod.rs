// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] runs the command through `sh -c` using
//!   `tokio::process::Command`, and kills/reaps it.
//! - [`supervisor`] owns the single job slot and the kill-then-relaunch
//!   coordination.
//! - [`job`] holds the job state machine and outcome types.

pub mod job;
pub mod launcher;
pub mod supervisor;

pub use job::{JobHandle, JobId, JobOutcome, JobSnapshot, JobState};
pub use launcher::ProcessLauncher;
pub use supervisor::Supervisor;
