//! Cooperative shutdown signalling
//!
//! A [`ShutdownTrigger`] flips a shared boolean once; every
//! [`ShutdownToken`] observes it. Loops check the flag at iteration
//! boundaries and use [`ShutdownToken::sleep`] for their polling delays so a
//! request cuts the wait short without interrupting a write sequence.
//!
//! [`TerminationSignals`] turns SIGINT and SIGTERM into such a request.

use std::io;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Requests shutdown.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observes shutdown requests.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger and token.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownToken { rx })
}

impl ShutdownTrigger {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another token observing this trigger.
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownToken {
    /// A token that is never triggered.
    pub fn never() -> Self {
        shutdown_channel().1
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration` or until shutdown is requested.
    ///
    /// Returns `true` when shutdown has been requested.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_requested() {
            return true;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        let trigger_dropped = tokio::select! {
            _ = &mut sleep => false,
            changed = self.rx.changed() => changed.is_err(),
        };

        // Trigger dropped without firing: finish the delay
        if trigger_dropped {
            sleep.await;
        }

        self.is_requested()
    }
}

/// Listeners for SIGINT and SIGTERM.
///
/// Handlers are registered by [`TerminationSignals::install`], so a signal
/// delivered between installation and the first [`recv`](Self::recv) is
/// not lost.
#[derive(Debug)]
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    /// Register the handlers. Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next signal and return its name.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}

/// Fire `trigger` on the first SIGINT or SIGTERM.
pub fn trigger_on_signal(trigger: ShutdownTrigger) -> io::Result<JoinHandle<()>> {
    let mut signals = TerminationSignals::install()?;
    Ok(tokio::spawn(async move {
        let name = signals.recv().await;
        info!("Received {}, shutting down gracefully...", name);
        trigger.trigger();
    }))
}
