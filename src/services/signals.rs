use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::models::Identity;

const DEFAULT_CAPACITY: usize = 64;

/// Notifications the recommendation pipeline reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A new seed was written for `identity`
    SeedChanged { identity: Identity },
    /// The user signed in or out
    AuthChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    SeedChanged,
    AuthChanged,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::SeedChanged { .. } => SignalKind::SeedChanged,
            Signal::AuthChanged => SignalKind::AuthChanged,
        }
    }
}

/// Process-wide publish/subscribe for [`Signal`]s
#[derive(Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<Signal>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SignalBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes a signal. Having no subscribers is not an error.
    pub fn publish(&self, signal: Signal) {
        let kind = signal.kind();
        match self.tx.send(signal) {
            Ok(receivers) => tracing::debug!(?kind, receivers, "Signal published"),
            Err(_) => tracing::debug!(?kind, "Signal published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }

    /// Runs `handler` for every signal of `kind` until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_signal<F>(&self, kind: SignalKind, handler: F) -> Subscription
    where
        F: Fn(Signal) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(signal) if signal.kind() == kind => handler(signal),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(?kind, skipped, "Signal subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription { kind, task }
    }
}

/// Handle to a running [`SignalBus::on_signal`] listener
pub struct Subscription {
    kind: SignalKind,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
