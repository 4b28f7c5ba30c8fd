// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{RelaunchError, Result};
use crate::exec::Supervisor;
use crate::watch::{EventSource, WatchTarget};

use super::core::{CoreCommand, LoopCore, StepOutcome};
use super::{LoopEvent, LoopExit};

/// Drives the supervisor from an event source.
///
/// `EventSource::wait` blocks, so it runs on a dedicated OS thread that
/// forwards [`LoopEvent`]s over a channel. That thread is detached: it may
/// still be parked in `wait` after the loop returns.
pub struct WatchLoop {
    source: Box<dyn EventSource>,
    supervisor: Supervisor,
    core: LoopCore,
}

impl fmt::Debug for WatchLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchLoop")
            .field("source", &self.source.name())
            .field("targets", &self.source.targets())
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl WatchLoop {
    pub fn new(
        source: Box<dyn EventSource>,
        supervisor: Supervisor,
        command: impl Into<String>,
    ) -> Self {
        Self {
            source,
            supervisor,
            core: LoopCore::new(command),
        }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn targets(&self) -> &[WatchTarget] {
        self.source.targets()
    }

    /// Register every path, in order, stopping at the first failure.
    pub fn register_all(&mut self, paths: &[PathBuf]) -> Result<Vec<WatchTarget>> {
        if paths.is_empty() {
            return Err(RelaunchError::Argument(
                "must watch at least one file".to_string(),
            ));
        }

        let mut targets = Vec::with_capacity(paths.len());
        for path in paths {
            targets.push(self.source.register(path)?);
        }

        info!(
            backend = self.source.name(),
            count = targets.len(),
            "watching files"
        );
        Ok(targets)
    }

    /// Run until the command is empty, `shutdown` resolves, the source is
    /// exhausted, or the source fails.
    pub async fn run<S>(self, shutdown: S) -> Result<LoopExit>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let WatchLoop {
            source,
            supervisor,
            mut core,
        } = self;

        let (tx, mut rx) = mpsc::channel::<LoopEvent>(64);
        spawn_source_thread(source, tx.clone())?;

        tokio::spawn(async move {
            shutdown.await;
            let _ = tx.send(LoopEvent::ShutdownRequested).await;
        });

        core.start();
        info!("relaunch watch loop started");

        loop {
            let event = match rx.recv().await {
                Some(e) => e,
                None => {
                    debug!("loop event channel closed");
                    LoopEvent::SourceExhausted
                }
            };

            debug!(?event, "watch loop received event");
            let step = core.step(event);

            for command in step.commands {
                execute_command(&supervisor, command).await;
            }

            match step.outcome {
                StepOutcome::Continue => {}
                StepOutcome::Exit(why) => {
                    info!(?why, fired = core.fired(), "watch loop exiting");
                    return Ok(why);
                }
                StepOutcome::Fail(err) => return Err(err),
            }
        }
    }
}

async fn execute_command(supervisor: &Supervisor, command: CoreCommand) {
    match command {
        CoreCommand::Trigger(cmd) => {
            // Detached: the worker reaps its own child.
            let job = supervisor.trigger(cmd);
            debug!(job = job.id(), "dispatched job");
        }
        CoreCommand::StopJob => {
            supervisor.stop();
        }
        CoreCommand::AwaitIdle => supervisor.wait_idle().await,
    }
}

/// Pump `EventSource::wait` on its own thread until it ends or the loop goes
/// away.
fn spawn_source_thread(
    mut source: Box<dyn EventSource>,
    tx: mpsc::Sender<LoopEvent>,
) -> Result<()> {
    thread::Builder::new()
        .name("relaunch-watch".to_string())
        .spawn(move || {
            loop {
                let event = match source.wait() {
                    Ok(Some(fired)) => LoopEvent::Fired(fired),
                    Ok(None) => {
                        let _ = tx.blocking_send(LoopEvent::SourceExhausted);
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "event source failed");
                        let _ = tx.blocking_send(LoopEvent::SourceFailed(err));
                        break;
                    }
                };

                if tx.blocking_send(event).is_err() {
                    debug!("watch loop gone; stopping event source thread");
                    break;
                }
            }
        })?;

    Ok(())
}
