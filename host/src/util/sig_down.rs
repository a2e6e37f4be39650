//! Graceful shutdown signal handling.
//!
//! [`SigDown`] listens for SIGTERM and SIGINT and turns the first one received into
//! a cancelled [`CancellationToken`]. The HTTP server waits on that token to drain
//! in-flight requests before the devnet state is dropped.
//!
//! ```ignore
//! let sig_down = SigDown::try_new()?;
//! let token = sig_down.cancellation_token();
//! axum::serve(listener, router)
//!     .with_graceful_shutdown(async move { token.cancelled().await })
//!     .await?;
//! ```

use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub struct SigDown {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl SigDown {
    /// Registers the signal handlers. Fails if the OS refuses the registration.
    pub fn try_new() -> Result<Self, std::io::Error> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let inner = CancellationToken::new();
        let outer = inner.clone();
        let task_tracker = TaskTracker::new();
        task_tracker.spawn(async move {
            let received = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            tracing::info!(signal = received, "Shutting down");
            inner.cancel();
        });
        task_tracker.close();
        Ok(Self {
            task_tracker,
            cancellation_token: outer,
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Waits for a shutdown signal and for the listener task to finish.
    pub async fn recv(&self) {
        self.cancellation_token.cancelled().await;
        self.task_tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_starts_live() {
        let sig_down = SigDown::try_new().unwrap();
        let token = sig_down.cancellation_token();
        assert!(!token.is_cancelled());
        token.cancel();
        // Cancelling a clone is observed through the shared token.
        sig_down.cancellation_token().cancelled().await;
    }
}
