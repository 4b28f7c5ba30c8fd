// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelaunchError {
    #[error("Argument error: {0}")]
    Argument(String),

    #[error("can only watch regular files: {}", path.display())]
    NotRegularFile { path: PathBuf },

    #[error("cannot watch {}: {message}", path.display())]
    WatchSetup {
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    #[error("cannot start the {backend} event backend: {message}")]
    BackendInit {
        backend: &'static str,
        code: Option<i32>,
        message: String,
    },

    #[error("waiting for file events failed: {message}")]
    Wait { code: Option<i32>, message: String },

    #[error("failed to spawn `{command}`: {message}")]
    Spawn {
        command: String,
        code: Option<i32>,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelaunchError {
    /// OS error code carried by native failures, if any.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            RelaunchError::WatchSetup { code, .. }
            | RelaunchError::BackendInit { code, .. }
            | RelaunchError::Wait { code, .. }
            | RelaunchError::Spawn { code, .. } => *code,
            RelaunchError::Io(err) => err.raw_os_error(),
            _ => None,
        }
    }

    pub(crate) fn watch_setup(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        RelaunchError::WatchSetup {
            path: path.into(),
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }

    pub(crate) fn wait(err: &std::io::Error) -> Self {
        RelaunchError::Wait {
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RelaunchError>;
