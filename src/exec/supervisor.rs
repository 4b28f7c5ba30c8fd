// src/exec/supervisor.rs

//! Single-slot process supervisor.
//!
//! There is never more than one *current* job. A trigger replaces the current
//! job with a new one and asks the old job's worker to kill its child; each
//! worker is the only code that signals or reaps its own child, so a kill can
//! never reach a pid the OS has already recycled.
//!
//! Workers form a chain: a new worker does not spawn until the worker it
//! replaced has reaped its child, so two children are never live at once.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use super::job::{JobHandle, JobId, JobOutcome, JobSnapshot, JobState};
use super::launcher::ProcessLauncher;

/// The current job record. Everything in here changes together.
struct Slot {
    id: JobId,
    command: String,
    state: JobState,
    cancel: Option<oneshot::Sender<()>>,
    /// Resolves once this job's worker is done with its child.
    done: Option<oneshot::Receiver<()>>,
}

impl Slot {
    /// Ask this job's worker to kill its child. Returns the pid, if known.
    fn cancel(&mut self) -> Option<u32> {
        let pid = match self.state {
            JobState::Running { pid } => Some(pid),
            JobState::Killing { pid } => pid,
            JobState::Launching | JobState::Idle => None,
        };

        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(job = self.id, "worker already finished while cancelling");
            }
        }
        pid
    }
}

#[derive(Default)]
struct Inner {
    last_id: JobId,
    current: Option<Slot>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<JobState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the slot's state. Called with the lock held so observers see
    /// transitions in order.
    fn publish(&self, inner: &Inner) {
        let state = inner
            .current
            .as_ref()
            .map(|slot| slot.state)
            .unwrap_or(JobState::Idle);
        self.state_tx.send_replace(state);
    }
}

/// Runs the watched command, keeping at most one job current.
///
/// Cloning is cheap; clones share the same job slot.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
    launcher: ProcessLauncher,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("launcher", &self.launcher)
            .field("current", &self.current())
            .finish()
    }
}

impl Supervisor {
    pub fn new(launcher: ProcessLauncher) -> Self {
        let (state_tx, _) = watch::channel(JobState::Idle);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                state_tx,
            }),
            launcher,
        }
    }

    /// Start `command` as the new current job, preempting any job in flight.
    ///
    /// Returns immediately; the child is spawned and awaited by a worker task.
    /// Must be called from within a Tokio runtime.
    pub fn trigger(&self, command: impl Into<String>) -> JobHandle {
        let command = command.into();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let (id, prev_done) = {
            let mut inner = self.shared.lock();

            let prev_done = inner.current.as_mut().and_then(|prev| {
                let pid = prev.cancel();
                info!(job = prev.id, ?pid, "preempting running job");
                prev.done.take()
            });

            inner.last_id += 1;
            let id = inner.last_id;
            inner.current = Some(Slot {
                id,
                command: command.clone(),
                state: JobState::Launching,
                cancel: Some(cancel_tx),
                done: Some(done_rx),
            });
            self.shared.publish(&inner);
            (id, prev_done)
        };

        debug!(job = id, command = %command, "job triggered");

        let worker = Worker {
            shared: Arc::clone(&self.shared),
            launcher: self.launcher.clone(),
            id,
            command,
        };
        let handle = tokio::spawn(worker.run(prev_done, cancel_rx, done_tx));

        JobHandle { id, worker: handle }
    }

    /// Kill the current job without starting another.
    ///
    /// The slot stays in `Killing` until the worker has reaped the child.
    pub fn stop(&self) -> Option<JobId> {
        let mut inner = self.shared.lock();
        let slot = inner.current.as_mut()?;

        let pid = slot.cancel();
        slot.state = JobState::Killing { pid };
        let id = slot.id;
        self.shared.publish(&inner);

        info!(job = id, ?pid, "stopping current job");
        Some(id)
    }

    /// The current job, if any.
    pub fn current(&self) -> Option<JobSnapshot> {
        let inner = self.shared.lock();
        inner.current.as_ref().map(|slot| JobSnapshot {
            id: slot.id,
            command: slot.command.clone(),
            state: slot.state,
        })
    }

    /// Id of the most recently triggered job, current or not.
    pub fn last_job_id(&self) -> Option<JobId> {
        let inner = self.shared.lock();
        (inner.last_id > 0).then_some(inner.last_id)
    }

    pub fn state(&self) -> JobState {
        *self.shared.state_tx.borrow()
    }

    /// Resolve once no job is current.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.state_tx.subscribe();
        // The sender lives in `self.shared`, so this cannot fail.
        let _ = rx.wait_for(|state| *state == JobState::Idle).await;
    }
}

/// Lifecycle of one job: spawn, wait or kill, then release the slot.
struct Worker {
    shared: Arc<Shared>,
    launcher: ProcessLauncher,
    id: JobId,
    command: String,
}

impl Worker {
    async fn run(
        self,
        prev_done: Option<oneshot::Receiver<()>>,
        cancel_rx: oneshot::Receiver<()>,
        done_tx: oneshot::Sender<()>,
    ) -> JobOutcome {
        // The previous worker was cancelled before this one existed, so this
        // only waits for its kill and reap. A dropped sender counts as done.
        if let Some(prev_done) = prev_done {
            let _ = prev_done.await;
            debug!(job = self.id, "previous job reaped");
        }

        let outcome = self.supervise(cancel_rx).await;
        let _ = done_tx.send(());
        outcome
    }

    async fn supervise(&self, mut cancel_rx: oneshot::Receiver<()>) -> JobOutcome {
        if !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty)) {
            debug!(job = self.id, "job cancelled before it started");
            self.release();
            return JobOutcome::Cancelled;
        }

        let mut child = match self.launcher.spawn(&self.command) {
            Ok(child) => child,
            Err(err) => {
                error!(job = self.id, command = %self.command, error = %err, "failed to start job");
                self.release();
                return JobOutcome::SpawnFailed(err);
            }
        };

        let pid = child.id();
        self.mark_started(pid);
        info!(job = self.id, ?pid, command = %self.command, "job started");

        // A dropped sender also counts as cancellation; the slot only drops it
        // after sending or once this job is no longer current.
        let outcome = tokio::select! {
            status = self.launcher.wait(&mut child) => match status {
                Ok(status) => {
                    info!(
                        job = self.id,
                        exit_code = status.code(),
                        success = status.success(),
                        "job exited"
                    );
                    JobOutcome::Exited(status)
                }
                Err(err) => {
                    warn!(job = self.id, error = %err, "waiting for job failed");
                    JobOutcome::Lost(err)
                }
            },

            _ = &mut cancel_rx => {
                match self.launcher.terminate(&mut child).await {
                    Ok(status) => {
                        info!(job = self.id, ?status, "job killed and reaped");
                        JobOutcome::Killed
                    }
                    Err(err) => {
                        warn!(job = self.id, error = %err, "failed to kill job");
                        JobOutcome::Lost(err)
                    }
                }
            }
        };

        self.release();
        outcome
    }

    /// Record the child's pid if this job is still current.
    fn mark_started(&self, pid: Option<u32>) {
        let mut inner = self.shared.lock();
        let Some(slot) = inner.current.as_mut().filter(|slot| slot.id == self.id) else {
            debug!(job = self.id, "job superseded before it started");
            return;
        };

        slot.state = match (slot.state, pid) {
            (JobState::Launching, Some(pid)) => JobState::Running { pid },
            (JobState::Killing { .. }, pid) => JobState::Killing { pid },
            (state, _) => state,
        };
        self.shared.publish(&inner);
    }

    /// Clear the slot if it still belongs to this job.
    fn release(&self) {
        let mut inner = self.shared.lock();
        if inner.current.as_ref().is_some_and(|slot| slot.id == self.id) {
            inner.current = None;
            self.shared.publish(&inner);
            debug!(job = self.id, "job slot released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn idle_until_triggered() {
        let sup = Supervisor::new(ProcessLauncher::default());
        assert_eq!(sup.state(), JobState::Idle);
        assert!(sup.current().is_none());
        assert!(sup.stop().is_none());
        assert!(sup.last_job_id().is_none());
    }

    #[tokio::test]
    async fn running_job_reports_pid_and_command() {
        let sup = Supervisor::new(ProcessLauncher::default());
        let handle = sup.trigger("sleep 2");

        let mut rx = sup.shared.state_tx.subscribe();
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| matches!(s, JobState::Running { .. })),
        )
        .await
        .unwrap()
        .unwrap();

        let snap = sup.current().unwrap();
        assert_eq!(snap.id, handle.id());
        assert_eq!(snap.command, "sleep 2");
        assert!(matches!(snap.state, JobState::Running { pid } if pid > 0));

        assert_eq!(sup.stop(), Some(handle.id()));
        assert!(matches!(sup.state(), JobState::Killing { pid: Some(_) }));
        assert!(matches!(handle.outcome().await, JobOutcome::Killed));
        assert_eq!(sup.state(), JobState::Idle);
    }

    #[tokio::test]
    async fn superseded_before_start_never_spawns() {
        let sup = Supervisor::new(ProcessLauncher::default());
        // On the current-thread test runtime neither worker runs until we
        // await, so the first one finds its cancellation already sent.
        let first = sup.trigger("sleep 5");
        let second = sup.trigger("true");

        assert!(matches!(first.outcome().await, JobOutcome::Cancelled));
        assert!(second.outcome().await.success());
    }

    #[tokio::test]
    async fn job_ids_increase() {
        let sup = Supervisor::new(ProcessLauncher::default());
        let a = sup.trigger("true");
        let b = sup.trigger("true");
        assert!(b.id() > a.id());
        a.outcome().await;
        b.outcome().await;
        sup.wait_idle().await;
        assert!(sup.current().is_none());
    }
}
