//! Cooperative shutdown flag shared by the session threads.
//!
//! Signal handling only ever calls [`Shutdown::trigger`]; the loops poll
//! [`Shutdown::is_triggered`] at their safe points and return, and resources
//! are released on the normal return path.

use log::{debug, info};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal::unix::{Signal, SignalKind, signal};

/// shutdown flag, cheap to clone
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// request shutdown, idempotent
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// SIGINT and SIGTERM handlers.
///
/// The handlers are registered by [`ShutdownSignal::install`] itself, not on
/// first poll, so neither signal has its default action once this exists.
pub struct ShutdownSignal {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownSignal {
    /// Register both handlers. Must be called within the tokio runtime.
    pub fn install() -> io::Result<Self> {
        let interrupt = signal(SignalKind::interrupt())?;
        let terminate = signal(SignalKind::terminate())?;
        debug!("Installed SIGINT and SIGTERM handlers");
        Ok(ShutdownSignal {
            interrupt,
            terminate,
        })
    }

    /// Wait for the next SIGINT or SIGTERM
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => {
                info!("Received Ctrl+C, shutting down...");
            },
            _ = self.terminate.recv() => {
                info!("Received SIGTERM, shutting down...");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_seen_by_clones() {
        let shutdown = Shutdown::new();
        let other = shutdown.clone();
        assert!(!other.is_triggered());
        shutdown.trigger();
        shutdown.trigger();
        assert!(other.is_triggered());
    }

    #[tokio::test]
    async fn test_signal_is_caught_before_first_poll() {
        let mut signals = ShutdownSignal::install().unwrap();
        raise(nix::sys::signal::Signal::SIGTERM).unwrap();
        tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .unwrap();
    }
}
