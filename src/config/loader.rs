// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawSettings, Settings};
use crate::errors::Result;
use crate::types::{KillScope, OneShotPolicy};

/// Load a TOML config file.
///
/// This only performs deserialization; checks on the merged values happen in
/// [`resolve_settings`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), ?config, "loaded config file");

    Ok(config)
}

/// Merge CLI arguments over the optional `--config` file and validate.
///
/// - `--file` entries replace the file's `files` list when present.
/// - The positional command replaces the file's `command`.
/// - Boolean flags only ever switch behaviour *off* (or to watch-once), so a
///   flag that was not given falls back to the file, then to the default.
pub fn resolve_settings(args: &CliArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => load_from_path(path)?,
        None => ConfigFile::default(),
    };

    Settings::try_from(merge(args, file))
}

fn merge(args: &CliArgs, file: ConfigFile) -> RawSettings {
    let files = if args.files.is_empty() {
        file.files
    } else {
        args.files.clone()
    };

    let header = !args.no_header && file.header.unwrap_or(true);

    let kill_scope = if args.no_process_group {
        KillScope::ShellOnly
    } else {
        KillScope::from_process_group_flag(file.process_group.unwrap_or(true))
    };

    let one_shot = if args.watch_once {
        OneShotPolicy::Once
    } else {
        file.one_shot.unwrap_or_default()
    };

    RawSettings {
        files,
        command: args.command.clone().or(file.command),
        header,
        kill_scope,
        one_shot,
        shell: file.shell,
    }
}
