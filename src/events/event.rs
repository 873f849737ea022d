//! # Runtime events emitted during a dispatcher run.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (slot index, host label, input line, exit code). Events are diagnostic
//! only: the dispatcher's behavior never depends on a subscriber observing
//! them.
//!
//! ## Ordering
//! Every event gets a globally unique, monotonically increasing `seq`;
//! subscribers can use it to restore publication order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A remote host failed its reachability probe; every slot on that
    /// host was quarantined.
    ///
    /// Sets: `host`, `reason`.
    SlotFaulted,

    /// A line was admitted and its job launched on a slot.
    ///
    /// Sets: `slot`, `host`, `line`.
    JobStarting,

    /// A job exited zero.
    ///
    /// Sets: `slot`, `host`, `line`.
    JobStopped,

    /// A job exited nonzero (including launch failures, reported as 127).
    ///
    /// Sets: `slot`, `host`, `line`, `code`.
    JobFailed,

    /// First interruption observed: no further admissions, running jobs
    /// continue.
    DrainRequested,

    /// Second interruption observed: running jobs were signalled directly.
    ForceRequested,

    /// A best-effort workdir mirror step failed (never fatal).
    ///
    /// Sets: `host`, `reason`.
    SyncFailed,

    /// Input exhausted and every slot reaped; the run is complete.
    AllDrained,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for trace output)
/// - remaining fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Slot index, if the event concerns one slot.
    pub slot: Option<usize>,
    /// Host label (`"local"` for local slots).
    pub host: Option<Arc<str>>,
    /// The input line the job carries.
    pub line: Option<Arc<str>>,
    /// Child exit code, for `JobFailed`.
    pub code: Option<i32>,
    /// Human-readable detail (probe error, sync error).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slot: None,
            host: None,
            line: None,
            code: None,
            reason: None,
        }
    }

    /// Attaches a slot index.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a host label.
    #[inline]
    pub fn with_host(mut self, host: impl Into<Arc<str>>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Attaches the input line.
    #[inline]
    pub fn with_line(mut self, line: impl Into<Arc<str>>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Attaches a child exit code.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches a human-readable detail.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::now(EventKind::JobStarting);
        let b = Event::now(EventKind::JobStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::now(EventKind::JobFailed)
            .with_slot(2)
            .with_host("fast.example")
            .with_line("in.tar")
            .with_code(1);
        assert_eq!(ev.slot, Some(2));
        assert_eq!(ev.host.as_deref(), Some("fast.example"));
        assert_eq!(ev.line.as_deref(), Some("in.tar"));
        assert_eq!(ev.code, Some(1));
    }
}
