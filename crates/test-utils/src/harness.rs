use std::path::PathBuf;
use std::sync::Arc;

use relaunch::engine::WatchLoop;
use relaunch::exec::{ProcessLauncher, Supervisor};
use relaunch::fs::mock::MockFileSystem;
use relaunch::types::OneShotPolicy;
use relaunch::watch::{MemorySource, MemoryTrigger};

/// A watch loop over the in-memory event source, with every path in
/// `files` present as a regular file in a mock filesystem.
pub struct MemoryLoop {
    pub watch_loop: WatchLoop,
    pub trigger: MemoryTrigger,
    pub supervisor: Supervisor,
    pub fs: MockFileSystem,
    pub files: Vec<PathBuf>,
}

impl MemoryLoop {
    pub fn new(files: &[&str], command: &str) -> Self {
        Self::build(files, command, None)
    }

    pub fn one_shot(files: &[&str], command: &str, policy: OneShotPolicy) -> Self {
        Self::build(files, command, Some(policy))
    }

    fn build(files: &[&str], command: &str, policy: Option<OneShotPolicy>) -> Self {
        let fs = MockFileSystem::new();
        for f in files {
            fs.add_file(f);
        }

        let (source, trigger) = MemorySource::new(Arc::new(fs.clone()));
        let source = match policy {
            Some(policy) => source.one_shot(policy),
            None => source,
        };

        let supervisor = Supervisor::new(ProcessLauncher::default());
        let watch_loop = WatchLoop::new(Box::new(source), supervisor.clone(), command);

        Self {
            watch_loop,
            trigger,
            supervisor,
            fs,
            files: files.iter().map(PathBuf::from).collect(),
        }
    }

    /// Register every file given at construction.
    pub fn register(&mut self) -> relaunch::errors::Result<()> {
        self.watch_loop.register_all(&self.files).map(|_| ())
    }
}
