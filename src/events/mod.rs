//! In-process publish/subscribe between editing surfaces
//!
//! Each subscriber gets its own mailbox channel; the owning surface drains it
//! from its event loop. Surfaces never share layer maps, only these events.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

mod messages;
pub use messages::{BusEvent, GlobalOverridesChanged};

type SubscriberId = u64;

#[derive(Debug, Default)]
struct BusInner {
    next_id: SubscriberId,
    subscribers: HashMap<SubscriberId, Sender<BusEvent>>,
}

/// Cloneable handle to one shared bus
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new mailbox. Dropping the returned handle unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, tx);
        debug!(subscriber = id, "subscribed to event bus");
        Subscription {
            id,
            receiver: rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every subscriber. Returns how many received it.
    pub fn publish(&self, event: BusEvent) -> usize {
        let mut inner = lock(&self.inner);
        let mut delivered = 0;
        inner.subscribers.retain(|_, tx| match tx.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            // Receiver gone without unsubscribing
            Err(_) => false,
        });
        debug!(event = event.name(), emitter = event.emitter(), delivered, "published event");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

/// Mailbox for one surface
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<BusEvent>,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Take every event received so far, oldest first
    pub fn drain(&self) -> Vec<BusEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            lock(&bus).subscribers.remove(&self.id);
            debug!(subscriber = self.id, "unsubscribed from event bus");
        }
    }
}

fn lock(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
