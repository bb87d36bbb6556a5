// tests/signals.rs

#![cfg(unix)]

use std::time::Duration;

use nix::sys::signal::{Signal, raise};
use tokio::time::{sleep, timeout};

use respawn::signals::{ShutdownSignal, SignalListener, spawn_signal_listener};
use respawn::supervisor::shutdown_channel;

// Signals are process-wide, so everything lives in one test to keep the
// listeners from seeing each other's signals.
#[tokio::test]
async fn termination_signals_request_shutdown() {
    let mut listener = SignalListener::install().unwrap();
    raise(Signal::SIGINT).unwrap();
    let got = timeout(Duration::from_secs(5), listener.recv()).await.unwrap();
    assert_eq!(got, Some(ShutdownSignal::Interrupt));
    assert_eq!(ShutdownSignal::Interrupt.to_string(), "SIGINT");

    raise(Signal::SIGTERM).unwrap();
    let got = timeout(Duration::from_secs(5), listener.recv()).await.unwrap();
    assert_eq!(got, Some(ShutdownSignal::Terminate));
    drop(listener);

    let (trigger, mut shutdown) = shutdown_channel();
    let _task = spawn_signal_listener(trigger).unwrap();
    assert!(!shutdown.is_requested());

    raise(Signal::SIGTERM).unwrap();
    timeout(Duration::from_secs(5), shutdown.requested())
        .await
        .expect("SIGTERM must request shutdown");
    assert!(shutdown.is_requested());

    // Repeated signals are absorbed while the supervisor is stopping.
    raise(Signal::SIGINT).unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(shutdown.is_requested());
}
