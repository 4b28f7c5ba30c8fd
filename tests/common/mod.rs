#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

pub use relaunch_test_utils::{init_tracing, with_timeout};

/// Poll until `path` has at least `n` lines, returning them.
pub async fn wait_for_lines(path: &Path, n: usize) -> Vec<String> {
    with_timeout(async {
        loop {
            if let Ok(contents) = tokio::fs::read_to_string(path).await {
                let lines: Vec<String> = contents.lines().map(str::to_string).collect();
                if lines.len() >= n {
                    return lines;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}

/// Whether a process with this pid is still running.
///
/// Zombies count as dead: an orphaned grandchild may never be reaped if the
/// test runs under an init that doesn't collect them.
pub fn pid_alive(pid: u32) -> bool {
    if cfg!(target_os = "linux") {
        return match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            // State is the first field after the parenthesised command name.
            Ok(stat) => stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.trim_start().chars().next())
                .is_some_and(|state| state != 'Z' && state != 'X'),
            Err(_) => false,
        };
    }

    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}
