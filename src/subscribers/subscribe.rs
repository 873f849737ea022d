//! # Subscriber trait.
//!
//! `Subscribe` is the extension point for consuming runtime events:
//! trace writers, progress meters, test collectors. Subscribers run on the
//! listener task owned by [`SubscriberSet`](crate::SubscriberSet), never on
//! the dispatch loop, so a slow subscriber delays other subscribers but
//! not admission or reaping.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for diagnostics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
