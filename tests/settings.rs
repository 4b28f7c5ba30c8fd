// tests/settings.rs
use std::error::Error;
use std::path::PathBuf;

use relaunch::config::{MAX_WATCHED_FILES, Settings, resolve_settings};
use relaunch::errors::RelaunchError;
use relaunch::types::{KillScope, OneShotPolicy};
use relaunch::write_header;
use relaunch_test_utils::builders::CliArgsBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::io::Result<PathBuf> {
    let path = dir.path().join("relaunch.toml");
    std::fs::write(&path, body)?;
    Ok(path)
}

#[test]
fn defaults_without_a_config_file() -> TestResult {
    let args = CliArgsBuilder::new()
        .files(["src/main.c", "Makefile"])
        .command("make run")
        .build();

    let settings = resolve_settings(&args)?;
    assert_eq!(
        settings.files(),
        &[PathBuf::from("src/main.c"), PathBuf::from("Makefile")]
    );
    assert_eq!(settings.command(), "make run");
    assert!(settings.header());
    assert_eq!(settings.kill_scope(), KillScope::ProcessGroup);
    assert_eq!(settings.one_shot(), OneShotPolicy::Rearm);
    assert!(settings.shell().is_none());
    Ok(())
}

#[test]
fn flags_map_onto_settings() -> TestResult {
    let args = CliArgsBuilder::new()
        .file("a.txt")
        .command("true")
        .no_header()
        .no_process_group()
        .watch_once()
        .build();

    let settings = resolve_settings(&args)?;
    assert!(!settings.header());
    assert_eq!(settings.kill_scope(), KillScope::ShellOnly);
    assert_eq!(settings.one_shot(), OneShotPolicy::Once);
    Ok(())
}

#[test]
fn config_file_supplies_everything() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        &dir,
        r#"
files = ["x.txt", "y.txt"]
command = "cargo test"
header = false
process_group = false
one_shot = "once"
shell = "/bin/bash"
"#,
    )?;

    let settings = resolve_settings(&CliArgsBuilder::new().config(&config).build())?;
    assert_eq!(settings.files(), &[PathBuf::from("x.txt"), PathBuf::from("y.txt")]);
    assert_eq!(settings.command(), "cargo test");
    assert!(!settings.header());
    assert_eq!(settings.kill_scope(), KillScope::ShellOnly);
    assert_eq!(settings.one_shot(), OneShotPolicy::Once);
    assert_eq!(settings.shell(), Some(std::path::Path::new("/bin/bash")));
    Ok(())
}

#[test]
fn cli_overrides_the_config_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        &dir,
        r#"
files = ["x.txt", "y.txt"]
command = "cargo test"
"#,
    )?;

    let args = CliArgsBuilder::new()
        .config(&config)
        .file("z.txt")
        .command("")
        .build();

    let settings = resolve_settings(&args)?;
    // CLI files replace the list instead of extending it.
    assert_eq!(settings.files(), &[PathBuf::from("z.txt")]);
    assert_eq!(settings.command(), "");
    Ok(())
}

#[test]
fn no_files_is_rejected() {
    let args = CliArgsBuilder::new().command("true").build();
    let err = resolve_settings(&args).unwrap_err();
    assert!(matches!(err, RelaunchError::Argument(_)), "got {err:?}");
}

#[test]
fn too_many_files_is_rejected() {
    let files: Vec<PathBuf> = (0..=MAX_WATCHED_FILES)
        .map(|i| PathBuf::from(format!("f{i}.txt")))
        .collect();
    let args = CliArgsBuilder::new().files(files).command("true").build();

    match resolve_settings(&args) {
        Err(RelaunchError::Argument(msg)) => assert!(msg.contains("1024"), "{msg}"),
        other => panic!("expected argument error, got {other:?}"),
    }
}

#[test]
fn exactly_the_limit_is_accepted() -> TestResult {
    let files: Vec<PathBuf> = (0..MAX_WATCHED_FILES)
        .map(|i| PathBuf::from(format!("f{i}.txt")))
        .collect();
    let args = CliArgsBuilder::new().files(files).command("true").build();

    assert_eq!(resolve_settings(&args)?.files().len(), MAX_WATCHED_FILES);
    Ok(())
}

#[test]
fn missing_command_is_rejected() {
    let args = CliArgsBuilder::new().file("a.txt").build();
    let err = resolve_settings(&args).unwrap_err();
    assert!(matches!(err, RelaunchError::Argument(_)), "got {err:?}");
}

#[test]
fn empty_path_is_rejected() {
    let args = CliArgsBuilder::new().file("a.txt").file("").command("true").build();
    let err = resolve_settings(&args).unwrap_err();
    assert!(err.to_string().contains("#2"), "got {err}");
}

#[test]
fn unknown_config_key_is_a_toml_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config = write_config(&dir, "files = [\"a\"]\nglob = \"*.rs\"\n")?;

    let err = resolve_settings(&CliArgsBuilder::new().config(&config).build()).unwrap_err();
    assert!(matches!(err, RelaunchError::Toml(_)), "got {err:?}");
    Ok(())
}

#[test]
fn missing_config_file_is_an_io_error() {
    let args = CliArgsBuilder::new()
        .config("/nonexistent/relaunch.toml")
        .file("a.txt")
        .command("true")
        .build();
    assert!(matches!(resolve_settings(&args), Err(RelaunchError::Io(_))));
}

#[test]
fn header_lists_files_then_command() -> TestResult {
    let args = CliArgsBuilder::new()
        .files(["src/a.c", "src/b.c"])
        .command("make && ./a.out")
        .build();
    let settings: Settings = resolve_settings(&args)?;

    let mut out = Vec::new();
    write_header(&mut out, &settings)?;

    assert_eq!(
        String::from_utf8(out)?,
        "Files:\n    src/a.c\n    src/b.c\nCommand: make && ./a.out\n"
    );
    Ok(())
}
