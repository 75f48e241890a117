//! Shutdown coordination for the gateway.

use tokio::sync::{broadcast, mpsc};

/// Coordinator for graceful shutdown.
///
/// Each long-running task holds a [`ShutdownListener`] obtained from
/// [`Shutdown::register`]. [`Shutdown::trigger`] notifies all of them and
/// [`Shutdown::wait`] resolves once every listener (and every
/// [`ShutdownGuard`] taken from one) has been dropped.
pub struct Shutdown {
    notify: broadcast::Sender<()>,
    done_tx: mpsc::Sender<()>,
    done_rx: mpsc::Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        let (done_tx, done_rx) = mpsc::channel(1);
        Self {
            notify,
            done_tx,
            done_rx,
        }
    }

    /// Hand out a listener to a task that must be drained on shutdown.
    pub fn register(&self) -> ShutdownListener {
        ShutdownListener {
            triggered: false,
            notify: self.notify.subscribe(),
            done: ShutdownGuard(self.done_tx.clone()),
        }
    }

    /// Notify every registered listener.
    pub fn trigger(&self) {
        let _ = self.notify.send(());
    }

    /// Wait until every listener and guard has been dropped.
    pub async fn wait(self) {
        let Self {
            done_tx, mut done_rx, ..
        } = self;
        drop(done_tx);
        // Never receives a value; returns `None` once all senders are gone.
        let _ = done_rx.recv().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps [`Shutdown::wait`] pending while alive.
#[derive(Debug, Clone)]
pub struct ShutdownGuard(#[allow(dead_code)] mpsc::Sender<()>);

/// A task's view of the shutdown signal.
#[derive(Debug)]
pub struct ShutdownListener {
    triggered: bool,
    notify: broadcast::Receiver<()>,
    done: ShutdownGuard,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Resolve once shutdown has been triggered (or the coordinator dropped).
    pub async fn recv(&mut self) {
        if self.triggered {
            return;
        }
        let _ = self.notify.recv().await;
        self.triggered = true;
    }

    /// A guard that outlives the listener, for when the listener itself is
    /// moved into a signal future.
    pub fn guard(&self) -> ShutdownGuard {
        self.done.clone()
    }
}
