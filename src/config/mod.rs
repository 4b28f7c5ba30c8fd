// src/config/mod.rs

//! Configuration for relaunch.
//!
//! Responsibilities:
//! - Define the optional TOML file model and the resolved `Settings`
//!   (`model.rs`).
//! - Load the file and merge it with CLI arguments (`loader.rs`).
//! - Validate the merged result (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve_settings};
pub use model::{ConfigFile, MAX_WATCHED_FILES, RawSettings, Settings};
