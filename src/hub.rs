// Subscriber registry and snapshot fan-out.
//
// Each subscriber owns a bounded queue. Publishing never waits: a full queue
// drops that envelope for that subscriber only, a closed queue unregisters it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::models::{BroadcastEnvelope, TelemetrySnapshot};

pub type SubscriberId = u64;

/// Outcome of one publish, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Subscribers whose queue was full; they miss this envelope.
    pub dropped: usize,
    /// Subscribers found closed and removed.
    pub pruned: usize,
    /// True when the snapshot was not newer than the last published one.
    pub stale: bool,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<SubscriberId, mpsc::Sender<Arc<BroadcastEnvelope>>>,
    last_sequence: Option<u64>,
}

pub struct BroadcastHub {
    registry: Mutex<Registry>,
    queue_capacity: usize,
    next_id: AtomicU64,
}

/// Receiving end of one subscription. Dropping it unregisters the subscriber.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<BroadcastEnvelope>>,
    hub: Arc<BroadcastHub>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next envelope; `None` once the hub has unregistered this subscriber.
    pub async fn recv(&mut self) -> Option<Arc<BroadcastEnvelope>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<BroadcastEnvelope>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

impl BroadcastHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            queue_capacity: queue_capacity.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.registry().subscribers.insert(id, tx);
        debug!(subscriber = id, "Subscriber registered");
        Subscription {
            id,
            rx,
            hub: Arc::clone(self),
        }
    }

    /// Removes a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.registry().subscribers.remove(&id).is_some() {
            debug!(subscriber = id, "Subscriber removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().subscribers.len()
    }

    /// Fans a snapshot out to every registered subscriber.
    ///
    /// Snapshots are delivered in strictly increasing sequence order; one that
    /// is not newer than the last published snapshot is ignored.
    pub fn publish(&self, snapshot: &Arc<TelemetrySnapshot>) -> PublishReport {
        let mut registry = self.registry();
        let mut report = PublishReport::default();

        if registry
            .last_sequence
            .is_some_and(|last| snapshot.sequence_number <= last)
        {
            debug!(
                sequence_number = snapshot.sequence_number,
                last_sequence = registry.last_sequence,
                "Skipping publish of stale snapshot"
            );
            report.stale = true;
            return report;
        }
        registry.last_sequence = Some(snapshot.sequence_number);

        let envelope = Arc::new(BroadcastEnvelope::bandwidth_update(Arc::clone(snapshot)));
        registry.subscribers.retain(|id, tx| match tx.try_send(Arc::clone(&envelope)) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(subscriber = *id, "Subscriber queue full; envelope dropped");
                report.dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber = *id, "Subscriber closed; pruned");
                report.pruned += 1;
                false
            }
        });
        report
    }
}
