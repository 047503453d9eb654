//! Cancellation tokens tied to the lifetime of whatever owns them.

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable flag that, once set, aborts every request awaiting it.
///
/// Clones share state. Cancellation is permanent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Cancels the token and wakes every waiter.
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives as long as `self`, so `wait_for` only returns once the flag is set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_clones_share_cancellation() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
        // Already cancelled: resolves immediately.
        clone.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waits_until_cancel() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let pending = tokio::time::timeout(Duration::from_secs(5), waiter.cancelled()).await;
        assert!(pending.is_err(), "uncancelled token must not resolve");

        token.cancel();
        let resolved = tokio::time::timeout(Duration::from_secs(5), waiter.cancelled()).await;
        assert!(resolved.is_ok());
    }
}
