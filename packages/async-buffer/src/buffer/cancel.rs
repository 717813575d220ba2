// cancellation token.

use std::sync::Arc;
use tokio::sync::watch;


/// Token which starts the graceful shutdown of a [`Buffer`](crate::Buffer)
///
/// Cancelling does not discard anything: values already put are still delivered, and the buffer
/// closes once they all have been received. Values put after cancelling but before the buffer
/// closes are delivered too.
///
/// Cloning produces another handle to the same token.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<watch::Sender<bool>>);

impl CancelToken {
    pub(crate) fn new() -> Self {
        CancelToken(Arc::new(watch::Sender::new(false)))
    }

    /// Start shutting down the buffer
    ///
    /// Idempotent: only the first call, from any handle to this token, has an effect.
    pub fn cancel(&self) {
        let first = self.0.send_if_modified(|cancelled| !std::mem::replace(cancelled, true));
        if first {
            debug!("buffer cancel requested");
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait until [`cancel`](Self::cancel) is called
    ///
    /// Resolves immediately if it already has been.
    pub async fn cancelled(&self) {
        let mut cancelled = self.0.subscribe();
        // the sender cannot be dropped while borrowed by self
        let _ = cancelled.wait_for(|&c| c).await;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_is_idempotent_and_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        clone.cancel();
        clone.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        waiter.await.unwrap();

        // already cancelled
        token.cancelled().await;
    }
}
