// tests/real_process.rs

//! The production backend against real `sh` / `sleep` processes.

#![cfg(unix)]

use std::time::Duration;

use tokio::process::Command;
use tokio::time::{Instant, timeout};

use respawn::config::ConfigFile;
use respawn::process::{
    ChildProcess, PkillTerminator, ProcessLauncher, ProcessTerminator, TokioLauncher,
};
use respawn::supervisor::{ShutdownTrigger, StartOutcome, Supervisor, shutdown_channel};
use respawn::types::ChildOutput;
use respawn_test_utils::builders::ConfigBuilder;
use respawn_test_utils::init_tracing;

fn quick(script: &str) -> ConfigBuilder {
    ConfigBuilder::new()
        .shell(script)
        .without_cleanup()
        .start_grace("300ms")
        .stop_timeout("2s")
        .settle("50ms")
}

fn supervisor(cfg: &ConfigFile) -> (Supervisor<TokioLauncher, PkillTerminator>, ShutdownTrigger) {
    let (trigger, shutdown) = shutdown_channel();
    (
        Supervisor::new(cfg, TokioLauncher, PkillTerminator, shutdown),
        trigger,
    )
}

fn pkill_available() -> bool {
    std::process::Command::new("pkill")
        .arg("-V")
        .output()
        .is_ok()
}

#[tokio::test]
async fn long_running_child_starts_and_stops_gracefully() {
    init_tracing();
    let cfg = quick("exec sleep 30").build();
    let (mut sup, _trigger) = supervisor(&cfg);

    assert_eq!(sup.start().await, StartOutcome::Started);
    assert!(sup.child_id().is_some());
    assert!(sup.is_running());

    let before = Instant::now();
    sup.stop().await;

    assert!(before.elapsed() < Duration::from_secs(2));
    assert_eq!(sup.child_id(), None);
    assert!(!sup.is_running());
}

#[tokio::test]
async fn child_ignoring_sigterm_is_killed_after_the_timeout() {
    init_tracing();
    let cfg = quick("trap '' TERM; exec sleep 30")
        .stop_timeout("500ms")
        .build();
    let (mut sup, _trigger) = supervisor(&cfg);

    assert_eq!(sup.start().await, StartOutcome::Started);

    let before = Instant::now();
    timeout(Duration::from_secs(5), sup.stop())
        .await
        .expect("stop must finish after escalating to SIGKILL");

    assert!(before.elapsed() >= Duration::from_millis(500));
    assert_eq!(sup.child_id(), None);
}

#[tokio::test]
async fn child_exiting_during_grace_fails_the_start() {
    init_tracing();
    let cfg = quick("exit 3").build();
    let (mut sup, _trigger) = supervisor(&cfg);

    assert_eq!(sup.start().await, StartOutcome::Failed);
    assert_eq!(sup.child_id(), None);
}

#[tokio::test]
async fn missing_program_fails_the_start() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .command("/nonexistent/respawn-test-program", &[])
        .without_cleanup()
        .build();
    let (mut sup, _trigger) = supervisor(&cfg);

    assert_eq!(sup.start().await, StartOutcome::Failed);
    assert_eq!(sup.child_id(), None);
}

#[tokio::test]
async fn restart_spawns_a_new_process() {
    init_tracing();
    let cfg = quick("exec sleep 30").build();
    let (mut sup, _trigger) = supervisor(&cfg);

    assert_eq!(sup.start().await, StartOutcome::Started);
    let first = sup.child_id().unwrap();

    assert_eq!(sup.restart().await, StartOutcome::Started);
    let second = sup.child_id().unwrap();
    assert_ne!(first, second);

    sup.stop().await;
}

#[tokio::test]
async fn piped_output_mode_starts_and_stops() {
    init_tracing();
    let cfg = quick("seq 1 100000; echo done >&2; exec sleep 30")
        .output(ChildOutput::Log)
        .build();
    let (mut sup, _trigger) = supervisor(&cfg);

    assert_eq!(sup.start().await, StartOutcome::Started);
    sup.stop().await;
    assert_eq!(sup.child_id(), None);
}

#[tokio::test]
async fn launcher_reports_exit_codes() {
    init_tracing();
    let cfg = quick("exit 7").build();
    let mut child = TokioLauncher.launch(&cfg.process).unwrap();

    let exit = timeout(Duration::from_secs(5), child.wait())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exit.code, Some(7));
}

#[tokio::test]
async fn pkill_terminates_matching_processes() {
    init_tracing();
    if !pkill_available() {
        return;
    }

    let mut stray = Command::new("sleep").arg("424242").spawn().unwrap();

    PkillTerminator
        .terminate_matching("^sleep 424242$")
        .await
        .unwrap();

    let status = timeout(Duration::from_secs(5), stray.wait())
        .await
        .expect("stray process should have been terminated")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn pkill_without_matches_is_not_an_error() {
    init_tracing();
    if !pkill_available() {
        return;
    }

    PkillTerminator
        .terminate_matching("respawn-no-such-process-[0-9]{12}")
        .await
        .unwrap();
}
