//! CLI smoke tests
//!
//! Exercises the argument surface and the early failure paths by
//! spawning the real binary. Full pipeline behavior is covered by the
//! core integration tests with stub collaborators; these tests only
//! need the stages that run before any external tool is reached.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn textmesh() -> Command {
    Command::new(env!("CARGO_BIN_EXE_textmesh"))
}

/// A scratch directory with valid input tables.
fn fixture_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("textmesh_smoke_{tag}_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("styles.csv"), "default,SomeFace,24,1.2\n").unwrap();
    fs::write(
        dir.join("strings.csv"),
        "key,width,height,en\ngreet,100,50,Hello\n",
    )
    .unwrap();
    dir
}

fn table_args(dir: &Path) -> Vec<String> {
    vec![
        "--styles".into(),
        dir.join("styles.csv").display().to_string(),
        "--strings".into(),
        dir.join("strings.csv").display().to_string(),
        "--fonts-dir".into(),
        dir.display().to_string(),
        "--out-dir".into(),
        dir.join("bin").display().to_string(),
    ]
}

#[test]
fn missing_language_argument_fails() {
    let output = textmesh().output().expect("failed to spawn textmesh");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr should show usage: {stderr}");
}

#[test]
fn help_succeeds() {
    let output = textmesh().arg("--help").output().expect("failed to spawn textmesh");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("language"), "help should describe the argument");
}

#[test]
fn unknown_language_fails_with_a_diagnostic() {
    let dir = fixture_dir("unknown_lang");
    let output = textmesh()
        .arg("de")
        .args(table_args(&dir))
        .output()
        .expect("failed to spawn textmesh");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("language key not present"),
        "unexpected diagnostic: {stderr}"
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_tables_fail_with_a_diagnostic() {
    let dir = fixture_dir("missing_tables");
    let output = textmesh()
        .arg("en")
        .arg("--styles")
        .arg(dir.join("nonexistent.csv"))
        .output()
        .expect("failed to spawn textmesh");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing resource"), "unexpected diagnostic: {stderr}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unreachable_shape_tool_is_a_collaborator_failure() {
    let dir = fixture_dir("no_tool");
    let output = textmesh()
        .arg("en")
        .args(table_args(&dir))
        .arg("--shape-tool")
        .arg(dir.join("no-such-tool"))
        .output()
        .expect("failed to spawn textmesh");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("collaborator"), "unexpected diagnostic: {stderr}");
    let _ = fs::remove_dir_all(&dir);
}
