//! # Event bus.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] so the
//! dispatcher can publish diagnostics without ever blocking on a slow
//! consumer.
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event
//!   is dropped.
//! - The ring buffer is bounded; a lagging receiver observes
//!   `RecvError::Lagged(n)` and skips the `n` oldest events.
//! - A receiver sees `RecvError::Closed` once every `Bus` clone is dropped,
//!   which is how the subscriber listener knows the run is over.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone; every clone publishes into the same ring.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given ring capacity (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; drops it if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receiver_sees_published_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::now(EventKind::AllDrained));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::AllDrained);
    }

    #[tokio::test]
    async fn receiver_closes_when_all_senders_drop() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        drop(bus);
        assert!(rx.recv().await.is_err());
    }
}
