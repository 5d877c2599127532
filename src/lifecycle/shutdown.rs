//! Shutdown coordination.

use std::sync::Arc;
use tokio::sync::watch;
use crate::lifecycle::signals::wait_for_termination;

/// Fans a single stop event out to the server and the health probe tasks.
///
/// The event is a latched flag, so a signal subscribed after [`Shutdown::trigger`]
/// still observes it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal that resolves once [`Shutdown::trigger`] is called.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal { rx: self.tx.subscribe() }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Trigger once the process is asked to terminate.
    pub async fn trigger_on_signal(self) {
        wait_for_termination().await;
        self.trigger();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`]. Clones observe the same event.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for the stop event. Returns immediately if it already fired.
    pub async fn recv(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            // Every coordinator handle is gone, so nothing can fire any more.
            std::future::pending::<()>().await;
        }
    }
}
