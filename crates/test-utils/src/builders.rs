#![allow(dead_code)]

use std::path::PathBuf;

use relaunch::cli::CliArgs;

/// Builder for `CliArgs` to simplify settings tests.
pub struct CliArgsBuilder {
    args: CliArgs,
}

impl CliArgsBuilder {
    pub fn new() -> Self {
        Self {
            args: CliArgs::default(),
        }
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.args.files.push(path.into());
        self
    }

    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.args.files.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.args.command = Some(cmd.to_string());
        self
    }

    pub fn config(mut self, path: impl Into<PathBuf>) -> Self {
        self.args.config = Some(path.into());
        self
    }

    pub fn no_header(mut self) -> Self {
        self.args.no_header = true;
        self
    }

    pub fn no_process_group(mut self) -> Self {
        self.args.no_process_group = true;
        self
    }

    pub fn watch_once(mut self) -> Self {
        self.args.watch_once = true;
        self
    }

    pub fn build(self) -> CliArgs {
        self.args
    }
}

impl Default for CliArgsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
