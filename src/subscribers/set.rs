//! # Subscriber fan-out.
//!
//! [`SubscriberSet`] drains the [`Bus`](crate::events::Bus) on a dedicated
//! task and hands each event to every subscriber in turn.
//!
//! ## Rules
//! - The listener runs until the bus closes (every `Bus` clone dropped),
//!   so awaiting the returned handle after the run flushes all trace
//!   output deterministically.
//! - A lagged receiver skips the oldest events and keeps going; dropped
//!   diagnostics never affect the run itself.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::events::Bus;

use super::subscribe::Subscribe;

/// Ordered set of subscribers sharing one bus listener.
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set from the given subscribers.
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs }
    }

    /// Spawns the listener task draining `bus` until it closes.
    ///
    /// Await the handle after dropping every `Bus` clone to guarantee all
    /// published events were delivered.
    pub fn spawn_listener(self, bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        for sub in &self.subs {
                            sub.on_event(&ev).await;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::events::{Event, EventKind};

    struct Collector(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Collector {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    #[tokio::test]
    async fn listener_delivers_in_order_and_stops_on_close() {
        let bus = Bus::new(16);
        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        let subs: Vec<Arc<dyn Subscribe>> = vec![collector.clone()];
        let set = SubscriberSet::new(subs);
        let listener = set.spawn_listener(&bus);

        bus.publish(Event::now(EventKind::JobStarting));
        bus.publish(Event::now(EventKind::JobStopped));
        bus.publish(Event::now(EventKind::AllDrained));
        drop(bus);

        listener.await.expect("listener join");
        let seen = collector.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                EventKind::JobStarting,
                EventKind::JobStopped,
                EventKind::AllDrained
            ]
        );
    }
}
