// src/exec/launcher.rs

//! Turns a command string into a running `sh -c` child.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::{RelaunchError, Result};
use crate::types::KillScope;

pub const DEFAULT_SHELL: &str = "sh";

#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    shell: PathBuf,
    scope: KillScope,
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(KillScope::default())
    }
}

impl ProcessLauncher {
    pub fn new(scope: KillScope) -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            scope,
        }
    }

    /// Use another POSIX shell instead of `sh` from `PATH`.
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }

    pub fn scope(&self) -> KillScope {
        self.scope
    }

    /// Start `sh -c <command>` with the terminal's stdout/stderr.
    ///
    /// In [`KillScope::ProcessGroup`] mode the shell leads a new process group
    /// and stdin is detached, since a background group reading the terminal
    /// would be stopped by `SIGTTIN`.
    pub fn spawn(&self, command: &str) -> Result<Child> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        match self.scope {
            KillScope::ProcessGroup => {
                cmd.stdin(Stdio::null());
                #[cfg(unix)]
                cmd.process_group(0);
            }
            KillScope::ShellOnly => {
                cmd.stdin(Stdio::inherit());
            }
        }

        cmd.spawn().map_err(|err| RelaunchError::Spawn {
            command: command.to_string(),
            code: err.raw_os_error(),
            message: err.to_string(),
        })
    }

    /// Wait for the child to exit and reap it.
    pub async fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        Ok(child.wait().await?)
    }

    /// Kill the child (or its whole group) and reap it.
    ///
    /// A child that already exited is only reaped; its status is returned.
    pub async fn terminate(&self, child: &mut Child) -> Result<ExitStatus> {
        // `try_wait` reaps a zombie, so `None` means the pid is still ours.
        if let Some(status) = child.try_wait()? {
            debug!(?status, "child exited before it could be killed");
            return Ok(status);
        }

        self.send_kill(child)?;
        Ok(child.wait().await?)
    }

    fn send_kill(&self, child: &mut Child) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{Signal, killpg};
            use nix::unistd::Pid;

            if let (KillScope::ProcessGroup, Some(pid)) = (self.scope, child.id()) {
                return match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    Ok(()) | Err(Errno::ESRCH) => Ok(()),
                    Err(errno) => Err(io::Error::from(errno).into()),
                };
            }
        }

        match child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped by tokio.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
