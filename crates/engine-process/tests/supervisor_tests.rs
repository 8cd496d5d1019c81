//! Engine lifecycle tests against fake engine scripts

use std::path::{Path, PathBuf};

use engine_process::{EngineProcess, StartOutcome, StopOutcome};
use tempfile::TempDir;

/// Write a fake engine script; `start` is expected to make it executable.
fn write_engine(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("engine.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    path
}

/// Poll for a file the engine script creates to report progress.
async fn wait_for_marker(marker: &Path) {
    for _ in 0..100 {
        if marker.exists() {
            return;
        }
        smol::Timer::after(std::time::Duration::from_millis(50)).await;
    }
    panic!("engine never created {}", marker.display());
}

#[smol_potat::test]
async fn stop_when_not_running_is_not_an_error() {
    let mut engine = EngineProcess::new();
    assert_eq!(engine.stop().await, StopOutcome::NotRunning);
    assert_eq!(engine.stop().await.to_string(), "engine not running");
}

#[smol_potat::test]
async fn missing_executable_fails_fast_with_resolved_path() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("missing-engine");

    let mut engine = EngineProcess::new();
    let outcome = engine.start(dir.path(), &exe, &[]).await;

    assert_eq!(outcome, StartOutcome::NotFound(exe.clone()));
    assert!(outcome.to_string().contains(exe.to_str().unwrap()));
    assert!(!engine.is_running());
}

#[smol_potat::test]
async fn second_start_reports_already_running() {
    let dir = TempDir::new().unwrap();
    let exe = write_engine(dir.path(), "sleep 30");

    let mut engine = EngineProcess::new();
    let first = engine.start(dir.path(), &exe, &[]).await;
    assert!(matches!(first, StartOutcome::Started { .. }));
    assert!(engine.is_running());

    let second = engine.start(dir.path(), &exe, &[]).await;
    assert_eq!(second, StartOutcome::AlreadyRunning);
    assert!(engine.is_running());

    engine.stop().await;
    assert!(!engine.is_running());
}

#[smol_potat::test]
async fn stop_confirms_a_prompt_exit() {
    let dir = TempDir::new().unwrap();
    let exe = write_engine(dir.path(), "sleep 30");

    let mut engine = EngineProcess::new();
    engine.start(dir.path(), &exe, &[]).await;

    let outcome = engine.stop().await;
    assert!(matches!(outcome, StopOutcome::Exited { .. }));
    assert!(outcome.to_string().contains("stopped"));
    assert!(!engine.is_running());
}

#[smol_potat::test]
async fn stop_assumes_exit_when_the_engine_ignores_termination() {
    let dir = TempDir::new().unwrap();
    // The script signals once the trap is installed; stopping any earlier
    // would race the termination signal against the trap.
    let exe = write_engine(
        dir.path(),
        "trap '' TERM\n: > ready.marker\nwhile true; do sleep 1; done",
    );

    let mut engine = EngineProcess::new();
    engine.start(dir.path(), &exe, &[]).await;
    wait_for_marker(&dir.path().join("ready.marker")).await;

    let outcome = engine.stop().await;
    assert_eq!(outcome, StopOutcome::AssumedExited);
    assert!(!engine.is_running());
}

#[smol_potat::test]
async fn restart_leaves_one_tracked_engine() {
    let dir = TempDir::new().unwrap();
    let exe = write_engine(dir.path(), "sleep 30");

    let mut engine = EngineProcess::new();
    let first = engine.start(dir.path(), &exe, &[]).await;
    let StartOutcome::Started { pid: first_pid } = first else {
        panic!("expected a started engine, got {first}");
    };

    let restarted = engine.restart(dir.path(), &exe, &[]).await;
    let StartOutcome::Started { pid: second_pid } = restarted else {
        panic!("expected a restarted engine, got {restarted}");
    };

    assert_ne!(first_pid, second_pid);
    assert!(engine.is_running());

    engine.stop().await;
}

#[smol_potat::test]
async fn engine_output_is_drained_without_blocking() {
    let dir = TempDir::new().unwrap();
    // Write well past a pipe buffer on both streams, then drop a marker.
    let exe = write_engine(
        dir.path(),
        "i=0\nwhile [ $i -lt 1024 ]; do\n  printf '%01024d' 0\n  printf '%01024d' 0 >&2\n  i=$((i+1))\ndone\n: > finished.marker\nsleep 30",
    );

    let mut engine = EngineProcess::new();
    engine.start(dir.path(), &exe, &[]).await;

    // Without a drain the script wedges mid-loop and this times out.
    wait_for_marker(&dir.path().join("finished.marker")).await;

    let outcome = engine.stop().await;
    assert!(matches!(outcome, StopOutcome::Exited { .. }));
}
