// src/config/validate.rs

use crate::config::model::{MAX_WATCHED_FILES, RawSettings, Settings};
use crate::errors::{RelaunchError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = RelaunchError;

    fn try_from(mut raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_files(&raw)?;
        let command = raw.command.take().ok_or_else(|| {
            RelaunchError::Argument("missing COMMAND (pass it as the last argument)".to_string())
        })?;
        Ok(Settings::new_unchecked(raw, command))
    }
}

fn validate_files(raw: &RawSettings) -> Result<()> {
    if raw.files.is_empty() {
        return Err(RelaunchError::Argument(
            "must watch at least one file (use --file/-f)".to_string(),
        ));
    }
    if raw.files.len() > MAX_WATCHED_FILES {
        return Err(RelaunchError::Argument(format!(
            "at most {MAX_WATCHED_FILES} files can be watched (got {})",
            raw.files.len()
        )));
    }
    if let Some(empty) = raw.files.iter().position(|p| p.as_os_str().is_empty()) {
        return Err(RelaunchError::Argument(format!(
            "--file #{} is an empty path",
            empty + 1
        )));
    }
    Ok(())
}
