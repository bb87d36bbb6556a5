// src/supervisor/shutdown.rs

//! Shutdown request channel.
//!
//! Signal listeners hold a [`ShutdownTrigger`]; the supervisor holds the
//! matching [`Shutdown`] and is the only party that acts on a request. The
//! channel carries a single sticky flag, so a request made while nobody is
//! waiting is still seen on the next check.

use std::sync::Arc;

use tokio::sync::watch;

/// Create a connected trigger/receiver pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, Shutdown { rx })
}

/// Requests shutdown. Cheap to clone; requesting twice is harmless.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn request(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes shutdown requests.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    ///
    /// Never resolves if every trigger is dropped without requesting.
    /// Cancel-safe, so it can sit in a `tokio::select!` next to a sleep.
    pub async fn requested(&mut self) {
        let closed = self.rx.wait_for(|requested| *requested).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn request_is_sticky() {
        let (trigger, mut shutdown) = shutdown_channel();
        assert!(!shutdown.is_requested());

        trigger.request();
        trigger.request();

        assert!(shutdown.is_requested());
        tokio::time::timeout(Duration::from_secs(1), shutdown.requested())
            .await
            .expect("request made before waiting must be observed");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trigger_never_resolves() {
        let (trigger, mut shutdown) = shutdown_channel();
        drop(trigger);

        let res = tokio::time::timeout(Duration::from_secs(3600), shutdown.requested()).await;
        assert!(res.is_err());
        assert!(!shutdown.is_requested());
    }

    #[tokio::test]
    async fn wakes_a_waiting_task() {
        let (trigger, mut shutdown) = shutdown_channel();
        let waiter = tokio::spawn(async move {
            shutdown.requested().await;
        });

        tokio::task::yield_now().await;
        trigger.request();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must wake up")
            .unwrap();
    }
}
