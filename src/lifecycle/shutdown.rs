//! Stop signal shared by the HTTP server and the config watcher.

use tokio::sync::broadcast;

/// Fan-out stop signal.
///
/// Each background task holds a receiver from [`Shutdown::subscribe`] and
/// exits once it yields. Triggering more than once is a no-op for tasks that
/// already stopped.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every live subscriber. Returns how many were reached.
    pub fn trigger(&self) -> usize {
        let reached = self.tx.send(()).unwrap_or(0);
        tracing::debug!(tasks = reached, "shutdown triggered");
        reached
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
