//! Error types used by the jobfan runtime.
//!
//! This module defines two error enums:
//!
//! - [`SpecError`] — malformed slot specification or sync precondition;
//!   always fatal before any job is dispatched.
//! - [`RuntimeError`] — failures of the dispatch engine itself, including
//!   slot-table bookkeeping violations (always a defect, never a user error).
//!
//! Individual job failures are **not** errors at this level: a nonzero child
//! exit is recorded in the [`RunReport`](crate::RunReport) and only affects
//! the aggregate exit status.
//!
//! Both enums provide `as_label()` for stable snake_case identifiers in
//! diagnostics.

use thiserror::Error;

/// Process exit codes used by the `jobfan` binary.
pub mod exit {
    /// Every job exited zero and no fatal error occurred.
    pub const OK: i32 = 0;
    /// At least one job exited nonzero.
    pub const JOB_FAILURE: i32 = 1;
    /// Slot specification or sync precondition error (before dispatch).
    pub const SPEC: i32 = 2;
    /// Internal invariant violation (a defect).
    pub const INTERNAL: i32 = 3;
}

/// Errors raised while parsing a slot specification or validating the
/// working-directory sync preconditions.
///
/// All variants are fatal: they are reported before the first dispatch and
/// terminate the run with [`exit::SPEC`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The whole specification string is empty.
    #[error("empty slot specification")]
    Empty,

    /// A comma-separated entry is empty (e.g. `"2*,,remote"`).
    #[error("empty slot entry at position {position}")]
    EmptyEntry {
        /// Zero-based entry position in the spec string.
        position: usize,
    },

    /// A slot count of zero was given (e.g. `"0*remote"`).
    #[error("slot count must be positive in entry '{entry}'")]
    ZeroCount {
        /// The offending entry text.
        entry: String,
    },

    /// A hostname contains a character outside `[A-Za-z0-9.@-]`.
    #[error("invalid character '{ch}' in host of entry '{entry}'")]
    InvalidHost {
        /// The offending entry text.
        entry: String,
        /// First rejected character.
        ch: char,
    },

    /// An entry ends with `:` but no working directory follows.
    #[error("unterminated working directory in entry '{entry}'")]
    EmptyWorkdir {
        /// The offending entry text.
        entry: String,
    },

    /// Workdir sync is enabled but a slot declares no working directory.
    #[error("workdir sync requires a working directory on every slot; slot {index} has none")]
    SyncWorkdirMissing {
        /// Index of the slot without a working directory.
        index: usize,
    },

    /// Workdir sync is enabled and two slots share a (host, dir) pair.
    #[error("workdir sync requires unique (host, dir) pairs; '{host}:{dir}' is declared twice")]
    SyncWorkdirDuplicate {
        /// Host label of the duplicate pair (`local` for local slots).
        host: String,
        /// Duplicated directory.
        dir: String,
    },
}

impl SpecError {
    /// Returns a short stable label (snake_case) for diagnostics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SpecError::Empty => "spec_empty",
            SpecError::EmptyEntry { .. } => "spec_empty_entry",
            SpecError::ZeroCount { .. } => "spec_zero_count",
            SpecError::InvalidHost { .. } => "spec_invalid_host",
            SpecError::EmptyWorkdir { .. } => "spec_empty_workdir",
            SpecError::SyncWorkdirMissing { .. } => "sync_workdir_missing",
            SpecError::SyncWorkdirDuplicate { .. } => "sync_workdir_duplicate",
        }
    }
}

/// Errors produced by the dispatch engine at run time.
///
/// [`RuntimeError::Invariant`] is always fatal and always a defect: the slot
/// table bookkeeping contradicted itself (a terminated job with no owning
/// Busy slot, or no Idle slot when capacity arithmetic says one exists).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Slot-table bookkeeping inconsistency. Never a user-facing condition.
    #[error("internal invariant violation: {detail}")]
    Invariant {
        /// Human-readable description of the contradiction.
        detail: String,
    },

    /// The input line stream failed mid-read.
    #[error("reading input lines: {0}")]
    Input(#[from] std::io::Error),

    /// Every slot was quarantined by the probe; nothing can run.
    #[error("no usable slots: all {total} slots are faulted")]
    NoUsableSlots {
        /// Total table size.
        total: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for diagnostics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Invariant { .. } => "runtime_invariant",
            RuntimeError::Input(_) => "runtime_input",
            RuntimeError::NoUsableSlots { .. } => "runtime_no_usable_slots",
        }
    }

    /// Builds an [`RuntimeError::Invariant`] from a detail message.
    pub fn invariant(detail: impl Into<String>) -> Self {
        RuntimeError::Invariant {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_error_labels_are_stable() {
        assert_eq!(SpecError::Empty.as_label(), "spec_empty");
        assert_eq!(
            SpecError::ZeroCount { entry: "0*h".into() }.as_label(),
            "spec_zero_count"
        );
    }

    #[test]
    fn invariant_message_carries_detail() {
        let err = RuntimeError::invariant("no free slot, busy=2 len=2");
        assert!(err.to_string().contains("no free slot"));
        assert_eq!(err.as_label(), "runtime_invariant");
    }
}
