// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;

/// What a metadata query found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Other,
}

/// Abstract filesystem interface.
///
/// Only the metadata queries that watch registration needs are exposed.
pub trait FileSystem: Send + Sync + Debug {
    /// Follows symlinks, like `stat(2)`.
    fn file_kind(&self, path: &Path) -> io::Result<FileKind>;

    /// Absolute form of `path` without resolving symlinks.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn file_kind(&self, path: &Path) -> io::Result<FileKind> {
        let meta = fs::metadata(path)?;
        let kind = if meta.is_file() {
            FileKind::Regular
        } else if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        };
        Ok(kind)
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }
}
