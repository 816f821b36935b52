//! Cross-context broadcast bus.
//!
//! Execution contexts share no memory; the only coordination primitive is
//! this channel of value-only signals. Everything derived from it - most
//! importantly the advisory refresh lock - is best-effort.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the signal channel. Signals are tiny and stale ones are
/// harmless, so a lagged receiver just skips ahead.
const BUS_CAPACITY: usize = 64;

/// Refresh coordination signals exchanged between contexts.
#[derive(Debug, Clone)]
pub enum RefreshSignal {
    /// A context is about to refresh and claims the advisory lock.
    LockAcquired {
        owner: Uuid,
        acquired_at: DateTime<Utc>,
    },
    /// The owning context finished refreshing successfully.
    RefreshSucceeded { owner: Uuid },
    /// The owning context's refresh failed.
    RefreshFailed { owner: Uuid },
}

impl RefreshSignal {
    /// The context that emitted the signal.
    pub fn owner(&self) -> Uuid {
        match self {
            RefreshSignal::LockAcquired { owner, .. }
            | RefreshSignal::RefreshSucceeded { owner }
            | RefreshSignal::RefreshFailed { owner } => *owner,
        }
    }
}

/// Publish/subscribe channel connecting the refresh gates of independent
/// execution contexts.
#[derive(Clone)]
pub struct ContextBus {
    tx: broadcast::Sender<RefreshSignal>,
}

impl ContextBus {
    /// Create a new bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Subscribe to signals from every context on the bus.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshSignal> {
        self.tx.subscribe()
    }

    /// Publish a signal. Delivery is best-effort; a bus with no listeners
    /// is not an error.
    pub fn publish(&self, signal: RefreshSignal) {
        let _ = self.tx.send(signal);
    }
}

impl Default for ContextBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signals_reach_all_subscribers() {
        let bus = ContextBus::new();
        let mut rx_a = bus.subscribe();
        let mut rx_b = bus.subscribe();

        let owner = Uuid::new_v4();
        bus.publish(RefreshSignal::RefreshSucceeded { owner });

        assert_eq!(rx_a.recv().await.unwrap().owner(), owner);
        assert_eq!(rx_b.recv().await.unwrap().owner(), owner);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let bus = ContextBus::new();
        bus.publish(RefreshSignal::RefreshFailed {
            owner: Uuid::new_v4(),
        });
    }
}
