//! Shutdown coordination for the adapter.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Every long-running task and every load cycle holds a token derived from
/// this coordinator; triggering it cancels in-flight control-plane requests
/// and stops the admin server.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled when shutdown is triggered.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is triggered.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_child_tokens() {
        let shutdown = Shutdown::new();
        let cycle = shutdown.token().child_token();

        assert!(!cycle.is_cancelled());
        shutdown.trigger();

        shutdown.wait().await;
        assert!(shutdown.is_triggered());
        assert!(cycle.is_cancelled());
    }
}
