// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::io::Write;

use tracing::warn;

use crate::cli::CliArgs;
use crate::config::{Settings, resolve_settings};
use crate::engine::{LoopExit, WatchLoop};
use crate::errors::Result;
use crate::exec::{ProcessLauncher, Supervisor};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (CLI + optional config file)
/// - the platform's event source and watch registration
/// - the supervisor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<LoopExit> {
    let settings = resolve_settings(&args)?;

    let source = crate::watch::native_source(settings.one_shot())?;
    let mut launcher = ProcessLauncher::new(settings.kill_scope());
    if let Some(shell) = settings.shell() {
        launcher = launcher.with_shell(shell);
    }
    let supervisor = Supervisor::new(launcher);

    let mut watch_loop = WatchLoop::new(source, supervisor, settings.command());
    watch_loop.register_all(settings.files())?;

    if settings.header() {
        write_header(&mut std::io::stderr().lock(), &settings)?;
    }

    watch_loop.run(ctrl_c()).await
}

/// Print the startup summary: watched files, then the command.
pub fn write_header<W: Write>(out: &mut W, settings: &Settings) -> std::io::Result<()> {
    writeln!(out, "Files:")?;
    for file in settings.files() {
        writeln!(out, "    {}", file.display())?;
    }
    writeln!(out, "Command: {}", settings.command())?;
    out.flush()
}

/// Resolves on Ctrl-C. If the handler can't be installed, never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
