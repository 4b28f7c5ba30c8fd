// src/engine/core.rs

//! Pure watch-loop state machine.
//!
//! Consumes [`LoopEvent`]s and returns the commands the IO shell should run
//! against the supervisor, plus whether to keep going. No Tokio, channels or
//! processes in here.
//!
//! ```text
//! Initializing --start--> Watching --(fired)--> Watching
//!                            |
//!                            +--> Exiting(EmptyCommand | Shutdown | SourceExhausted)
//!                            +--> Failed
//! ```

use crate::engine::{LoopEvent, LoopExit};
use crate::errors::RelaunchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Initializing,
    Watching,
    Exiting(LoopExit),
    Failed,
}

/// Command produced by the core, to be executed by the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Preempt the current job (if any) and start this command.
    Trigger(String),
    /// Kill the current job without replacing it.
    StopJob,
    /// Wait until the supervisor has no current job.
    AwaitIdle,
}

#[derive(Debug)]
pub enum StepOutcome {
    Continue,
    Exit(LoopExit),
    Fail(RelaunchError),
}

/// Decision returned by the core after handling one `LoopEvent`.
#[derive(Debug)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub outcome: StepOutcome,
}

impl CoreStep {
    fn cont(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            outcome: StepOutcome::Continue,
        }
    }
}

#[derive(Debug)]
pub struct LoopCore {
    command: String,
    phase: LoopPhase,
    fired: u64,
}

impl LoopCore {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            phase: LoopPhase::Initializing,
            fired: 0,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Number of firings forwarded to the supervisor so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Registration is done; start accepting events.
    pub fn start(&mut self) {
        if self.phase == LoopPhase::Initializing {
            self.phase = LoopPhase::Watching;
        }
    }

    pub fn step(&mut self, event: LoopEvent) -> CoreStep {
        if self.phase != LoopPhase::Watching {
            return CoreStep::cont(Vec::new());
        }

        match event {
            LoopEvent::Fired(_) if self.command.is_empty() => {
                self.exit(Vec::new(), LoopExit::EmptyCommand)
            }
            LoopEvent::Fired(_) => {
                self.fired += 1;
                CoreStep::cont(vec![CoreCommand::Trigger(self.command.clone())])
            }
            LoopEvent::SourceExhausted => {
                self.exit(vec![CoreCommand::AwaitIdle], LoopExit::SourceExhausted)
            }
            LoopEvent::ShutdownRequested => self.exit(
                vec![CoreCommand::StopJob, CoreCommand::AwaitIdle],
                LoopExit::Shutdown,
            ),
            LoopEvent::SourceFailed(err) => {
                self.phase = LoopPhase::Failed;
                CoreStep {
                    commands: vec![CoreCommand::StopJob, CoreCommand::AwaitIdle],
                    outcome: StepOutcome::Fail(err),
                }
            }
        }
    }

    fn exit(&mut self, commands: Vec<CoreCommand>, why: LoopExit) -> CoreStep {
        self.phase = LoopPhase::Exiting(why);
        CoreStep {
            commands,
            outcome: StepOutcome::Exit(why),
        }
    }
}
