//! A single execution slot: identity, launch prefix, and live state.

use std::sync::Arc;

/// What a slot launches on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotKind {
    /// A child process on this machine.
    Local,
    /// A child process on `host`, reached through the secure-shell launcher.
    Remote {
        /// Target host string, exactly as declared in the slot
        /// specification.
        host: Arc<str>,
    },
}

impl SlotKind {
    /// `"local"` for local slots, the host string otherwise.
    pub fn host_label(&self) -> &str {
        match self {
            SlotKind::Local => "local",
            SlotKind::Remote { host } => host,
        }
    }

    /// Returns true for remote slots.
    pub fn is_remote(&self) -> bool {
        matches!(self, SlotKind::Remote { .. })
    }
}

/// Live state of a slot. Exactly one variant holds at any time.
///
/// `Idle → Busy → Idle` is the normal cycle; `Idle → Faulted` happens only
/// during the reachability probe, and `Faulted` is terminal for the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Free to accept a job.
    Idle,
    /// Running one job.
    Busy {
        /// OS pid of the child, when the spawn succeeded.
        pid: Option<u32>,
        /// The input line this job carries; released when reaped.
        line: String,
    },
    /// Quarantined by the reachability probe; excluded from dispatch.
    Faulted,
}

/// One execution channel, fixed for the run's lifetime.
///
/// The dispatcher exclusively owns and mutates `state`; everything else is
/// immutable after the table is built.
#[derive(Clone, Debug)]
pub struct Slot {
    /// Position in the table; doubles as dispatch priority (lower wins).
    pub index: usize,
    /// Local or remote execution.
    pub kind: SlotKind,
    /// Working directory: local chdir for local slots, a literal
    /// remote-side path for remote slots.
    pub workdir: Option<String>,
    /// Launch prefix: the command tokens, pre-expanded with the remote
    /// launcher and `cd` prefix for remote slots. The job line is appended
    /// per dispatch.
    pub base_argv: Vec<String>,
    /// Live state, owned by the dispatcher.
    pub state: SlotState,
}

impl Slot {
    /// Returns true when the slot can accept a job.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, SlotState::Idle)
    }

    /// Returns true while a job is running on this slot.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, SlotState::Busy { .. })
    }

    /// Returns true once the probe has quarantined this slot.
    pub fn is_faulted(&self) -> bool {
        matches!(self.state, SlotState::Faulted)
    }
}
