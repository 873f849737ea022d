//! Runtime events: the bus and the event payloads published on it.
//!
//! The dispatcher, prober, and sync step publish [`Event`]s to a shared
//! [`Bus`]; subscribers (see [`Subscribe`](crate::Subscribe)) consume them
//! for tracing. Publishing never blocks the control loop.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
