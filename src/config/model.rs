// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{KillScope, OneShotPolicy};

/// Upper bound on `--file` entries.
pub const MAX_WATCHED_FILES: usize = 1024;

/// Optional TOML config file.
///
/// ```toml
/// files = ["src/main.c", "Makefile"]
/// command = "make run"
/// header = true
/// process_group = true
/// one_shot = "rearm"
/// shell = "/bin/sh"
/// ```
///
/// Every key is optional; CLI arguments take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default)]
    pub command: Option<String>,

    /// Print the `Files:` / `Command:` header at startup.
    #[serde(default)]
    pub header: Option<bool>,

    /// Start the command in its own process group and kill the whole group.
    #[serde(default)]
    pub process_group: Option<bool>,

    /// Re-arm policy for one-shot backends.
    #[serde(default)]
    pub one_shot: Option<OneShotPolicy>,

    /// Shell used as `<shell> -c <command>`; `sh` from `PATH` if unset.
    #[serde(default)]
    pub shell: Option<PathBuf>,
}

/// CLI and config file merged, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub files: Vec<PathBuf>,
    pub command: Option<String>,
    pub header: bool,
    pub kill_scope: KillScope,
    pub one_shot: OneShotPolicy,
    pub shell: Option<PathBuf>,
}

/// Validated settings the watch loop runs with.
///
/// Construct through `Settings::try_from(RawSettings)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    files: Vec<PathBuf>,
    command: String,
    header: bool,
    kill_scope: KillScope,
    one_shot: OneShotPolicy,
    shell: Option<PathBuf>,
}

impl Settings {
    pub(crate) fn new_unchecked(raw: RawSettings, command: String) -> Self {
        Self {
            files: raw.files,
            command,
            header: raw.header,
            kill_scope: raw.kill_scope,
            one_shot: raw.one_shot,
            shell: raw.shell,
        }
    }

    /// Watched paths, at least one and at most [`MAX_WATCHED_FILES`].
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// May be empty, which means "stop on the first change".
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn header(&self) -> bool {
        self.header
    }

    pub fn kill_scope(&self) -> KillScope {
        self.kill_scope
    }

    pub fn one_shot(&self) -> OneShotPolicy {
        self.one_shot
    }

    pub fn shell(&self) -> Option<&Path> {
        self.shell.as_deref()
    }
}
