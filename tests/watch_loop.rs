// tests/watch_loop.rs
mod common;
use crate::common::{init_tracing, wait_for_lines, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::sync::oneshot;

use relaunch::engine::LoopExit;
use relaunch::errors::RelaunchError;
use relaunch::exec::JobState;
use relaunch::types::OneShotPolicy;
use relaunch_test_utils::harness::MemoryLoop;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn each_write_triggers_exactly_once() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let log = dir.path().join("fired.log");
    let cmd = format!("echo fired >> '{}'", log.display());

    let mut h = MemoryLoop::new(&["/w/a.txt", "/w/b.txt"], &cmd);
    h.fs.add_file("/w/unwatched.txt");
    h.register()?;

    let MemoryLoop {
        watch_loop,
        trigger,
        supervisor,
        ..
    } = h;
    let run = tokio::spawn(watch_loop.run(std::future::pending()));

    trigger.write_closed("/w/a.txt");
    wait_for_lines(&log, 1).await;
    trigger.write_closed("/w/unwatched.txt");
    trigger.write_closed("/w/b.txt");
    wait_for_lines(&log, 2).await;
    trigger.write_closed("/w/a.txt");
    wait_for_lines(&log, 3).await;

    // No injectors left: the source is exhausted and the loop ends.
    drop(trigger);
    let exit = with_timeout(run).await??;
    assert_eq!(exit, LoopExit::SourceExhausted);

    let contents = std::fs::read_to_string(&log)?;
    assert_eq!(contents.lines().count(), 3);
    assert_eq!(supervisor.last_job_id(), Some(3));
    assert_eq!(supervisor.state(), JobState::Idle);
    Ok(())
}

#[tokio::test]
async fn empty_command_stops_on_first_change() -> TestResult {
    init_tracing();

    let mut h = MemoryLoop::new(&["/w/a.txt"], "");
    h.register()?;

    let MemoryLoop {
        watch_loop,
        trigger,
        supervisor,
        ..
    } = h;
    let run = tokio::spawn(watch_loop.run(std::future::pending()));

    trigger.write_closed("/w/a.txt");
    let exit = with_timeout(run).await??;

    assert_eq!(exit, LoopExit::EmptyCommand);
    assert!(supervisor.last_job_id().is_none(), "no process may be spawned");
    Ok(())
}

#[test]
fn directory_is_rejected_before_the_loop() {
    init_tracing();

    let mut h = MemoryLoop::new(&["/w/a.txt", "/w/b.txt"], "true");
    h.fs.add_dir("/w/src");
    h.files.insert(1, "/w/src".into());

    match h.register() {
        Err(RelaunchError::NotRegularFile { path }) => assert_eq!(path, std::path::Path::new("/w/src")),
        other => panic!("expected NotRegularFile, got {other:?}"),
    }

    // Fail-fast: b.txt, listed after the directory, was never registered.
    let registered: Vec<_> = h.watch_loop.targets().iter().map(|t| t.path.clone()).collect();
    assert_eq!(registered, vec![std::path::PathBuf::from("/w/a.txt")]);
}

#[test]
fn missing_file_is_a_setup_error() {
    init_tracing();

    let mut h = MemoryLoop::new(&[], "true");
    h.files.push("/w/missing.txt".into());

    let err = h.register().unwrap_err();
    assert!(matches!(err, RelaunchError::WatchSetup { .. }), "got {err:?}");
}

#[test]
fn no_files_is_an_argument_error() {
    let mut h = MemoryLoop::new(&[], "true");
    assert!(matches!(h.register(), Err(RelaunchError::Argument(_))));
}

#[tokio::test]
async fn wait_failure_ends_the_loop_with_an_error() -> TestResult {
    init_tracing();

    let mut h = MemoryLoop::new(&["/w/a.txt"], "true");
    h.register()?;

    let MemoryLoop {
        watch_loop,
        trigger,
        ..
    } = h;
    let run = tokio::spawn(watch_loop.run(std::future::pending()));

    trigger.fail(9);
    match with_timeout(run).await? {
        Err(err @ RelaunchError::Wait { .. }) => assert_eq!(err.os_code(), Some(9)),
        other => panic!("expected wait error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_kills_the_running_job() -> TestResult {
    init_tracing();

    let mut h = MemoryLoop::new(&["/w/a.txt"], "sleep 30");
    h.register()?;

    let MemoryLoop {
        watch_loop,
        trigger,
        supervisor,
        ..
    } = h;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(watch_loop.run(async {
        let _ = stop_rx.await;
    }));

    trigger.write_closed("/w/a.txt");
    with_timeout(async {
        while !matches!(supervisor.state(), JobState::Running { .. }) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    stop_tx.send(()).map_err(|_| "loop already gone")?;
    let exit = with_timeout(run).await??;

    assert_eq!(exit, LoopExit::Shutdown);
    assert_eq!(supervisor.state(), JobState::Idle);
    Ok(())
}

#[tokio::test]
async fn watch_once_exhausts_after_every_file_fired() -> TestResult {
    init_tracing();

    let mut h = MemoryLoop::one_shot(&["/w/a.txt", "/w/b.txt"], "true", OneShotPolicy::Once);
    h.register()?;

    let MemoryLoop {
        watch_loop,
        trigger,
        supervisor,
        ..
    } = h;
    let run = tokio::spawn(watch_loop.run(std::future::pending()));

    trigger.write_closed("/w/a.txt");
    trigger.write_closed("/w/a.txt");
    trigger.write_closed("/w/b.txt");

    // The trigger is still alive; the loop ends because nothing is armed.
    let exit = with_timeout(run).await??;
    assert_eq!(exit, LoopExit::SourceExhausted);
    assert_eq!(supervisor.last_job_id(), Some(2));
    assert_eq!(supervisor.state(), JobState::Idle);
    drop(trigger);
    Ok(())
}

#[tokio::test]
async fn rearm_keeps_firing_on_the_same_file() -> TestResult {
    init_tracing();

    let mut h = MemoryLoop::one_shot(&["/w/a.txt"], "true", OneShotPolicy::Rearm);
    h.register()?;

    let MemoryLoop {
        watch_loop,
        trigger,
        supervisor,
        ..
    } = h;
    let run = tokio::spawn(watch_loop.run(std::future::pending()));

    for _ in 0..3 {
        trigger.write_closed("/w/a.txt");
    }
    drop(trigger);

    let exit = with_timeout(run).await??;
    assert_eq!(exit, LoopExit::SourceExhausted);
    assert_eq!(supervisor.last_job_id(), Some(3));
    Ok(())
}
