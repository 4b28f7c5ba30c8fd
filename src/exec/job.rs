// src/exec/job.rs

//! Job bookkeeping types shared by the supervisor and its callers.

use std::process::ExitStatus;

use tokio::task::JoinHandle;

use crate::errors::RelaunchError;

/// Monotonic job number; later triggers get larger ids.
pub type JobId = u64;

/// Lifecycle of the supervisor's single job slot.
///
/// ```text
/// Idle --trigger--> Launching --spawned--> Running(pid) --exit--> Idle
///                       |                      |
///                       +------stop()----------+--> Killing(pid) --reaped--> Idle
/// ```
///
/// A trigger in any state replaces the current job with a new `Launching`
/// one; the replaced job's worker kills and reaps its own child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Launching,
    Running { pid: u32 },
    /// `pid` is `None` if the job was stopped before its child started.
    Killing { pid: Option<u32> },
}

/// Point-in-time view of the current job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub command: String,
    pub state: JobState,
}

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The job was preempted or stopped; the child was killed and reaped.
    Killed,
    /// The job was preempted before its child was started.
    Cancelled,
    /// `sh` could not be started.
    SpawnFailed(RelaunchError),
    /// Waiting on or killing the child failed.
    Lost(RelaunchError),
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        matches!(self, JobOutcome::Exited(status) if status.success())
    }

    /// Killed, or cancelled before it started.
    pub fn was_preempted(&self) -> bool {
        matches!(self, JobOutcome::Killed | JobOutcome::Cancelled)
    }
}

/// Handle to a job's worker task.
///
/// Dropping the handle detaches the worker; it keeps running.
#[derive(Debug)]
pub struct JobHandle {
    pub(crate) id: JobId,
    pub(crate) worker: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the worker to finish and return how the job ended.
    pub async fn outcome(self) -> JobOutcome {
        match self.worker.await {
            Ok(outcome) => outcome,
            Err(join_err) => JobOutcome::Lost(RelaunchError::Other(anyhow::anyhow!(
                "job worker failed: {join_err}"
            ))),
        }
    }
}
