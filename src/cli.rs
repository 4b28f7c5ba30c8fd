// src/cli.rs

//! CLI argument parsing using `clap`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `relaunch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "relaunch",
    version,
    about = "Re-run a shell command whenever one of the watched files is written.",
    long_about = None
)]
pub struct CliArgs {
    /// File to watch (can be used multiple times, up to 1024).
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Command to run through `sh -c` on every change.
    ///
    /// An empty string makes the first change stop relaunch instead.
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Don't print the watched files and command at startup (`-nh` also works).
    #[arg(long)]
    pub no_header: bool,

    /// Only kill the `sh` process on relaunch, not the processes it started.
    #[arg(long)]
    pub no_process_group: bool,

    /// On one-shot backends (kqueue), stop watching a file after it fires once.
    #[arg(long)]
    pub watch_once: bool,

    /// Optional TOML file supplying defaults for the options above.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELAUNCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse the process arguments.
///
/// Help and version exit 0; any usage error is printed and exits 1.
pub fn parse() -> CliArgs {
    match CliArgs::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    }
}

/// Rewrite the legacy two-letter `-nh` flag, which clap can't express as a
/// short option. Arguments after `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut seen_separator = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if seen_separator {
                return arg;
            }
            if arg == "--" {
                seen_separator = true;
                arg
            } else if arg == "-nh" {
                OsString::from("--no-header")
            } else {
                arg
            }
        })
        .collect()
}
