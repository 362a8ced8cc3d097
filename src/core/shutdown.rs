//! Shutdown signal plumbing
//!
//! A single `ShutdownSignal` is shared between the OS signal bridge, the
//! statistics reporter and the daemon's main wait. The first trigger wins;
//! repeated signals while teardown is in flight are logged and ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Set-once shutdown latch backed by a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the shutdown. Returns `true` for the first caller only.
    pub fn trigger(&self) -> bool {
        let first = !self.triggered.swap(true, Ordering::SeqCst);
        if first {
            self.token.cancel();
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Child token for a task that must stop with the daemon but can also
    /// be cancelled independently.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Bridge OS termination signals onto the shutdown latch.
///
/// On unix both SIGTERM and SIGINT are watched and the one that fired is
/// logged; elsewhere Ctrl+C is the only source.
pub fn install_signal_bridge(signal: ShutdownSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let name = wait_for_signal().await;
            if signal.trigger() {
                info!(signal = name, "Shutdown signal received");
            } else {
                warn!(signal = name, "Shutdown already in progress, ignoring");
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Could not install SIGTERM handler, falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Could not install SIGINT handler");
            sigterm.recv().await;
            return "SIGTERM";
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_trigger_is_first_wins() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        signal.trigger();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_child_token_follows_parent() {
        let signal = ShutdownSignal::new();
        let child = signal.child_token();
        signal.trigger();
        timeout(Duration::from_secs(1), child.cancelled())
            .await
            .expect("child token should cancel with parent");
    }

    #[tokio::test]
    async fn test_child_token_can_cancel_independently() {
        let signal = ShutdownSignal::new();
        let child = signal.child_token();
        child.cancel();
        timeout(Duration::from_secs(1), child.cancelled())
            .await
            .expect("child cancels");
        assert!(!signal.is_triggered());
    }
}
