use super::{FileKind, FileSystem};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy)]
pub enum MockEntry {
    File,
    Dir,
    Fifo,
}

/// In-memory filesystem for registration tests.
///
/// Paths are stored as given; `absolute` returns them unchanged, so tests
/// should use absolute paths throughout.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Dir);
    }

    pub fn add_fifo(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Fifo);
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(path.to_path_buf(), entry);

        // Parents exist implicitly.
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            entries.entry(dir.to_path_buf()).or_insert(MockEntry::Dir);
            parent = dir.parent();
        }
    }
}

impl FileSystem for MockFileSystem {
    fn file_kind(&self, path: &Path) -> io::Result<FileKind> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(path) {
            Some(MockEntry::File) => Ok(FileKind::Regular),
            Some(MockEntry::Dir) => Ok(FileKind::Directory),
            Some(MockEntry::Fifo) => Ok(FileKind::Other),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )),
        }
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}
