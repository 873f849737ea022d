//! # Run configuration.
//!
//! Provides [`Config`], the centralized settings for one dispatcher run.
//!
//! Flag syntax is the binary's concern; the library only sees effects:
//! where lines come from, how slots are specified, what happens after a
//! job fails, and where diagnostics go.
//!
//! ## Slot spec resolution
//! [`Config::effective_slot_spec`] resolves in order:
//! 1. `slot_spec` set explicitly,
//! 2. the `JOBFAN_SLOTS` environment variable,
//! 3. `None` → one local slot per available CPU (minimum 1).

use std::path::PathBuf;

/// Environment variable consulted when no slot spec is configured.
pub const SLOTS_ENV: &str = "JOBFAN_SLOTS";

/// Where input lines are read from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InputSource {
    /// The process's standard input.
    #[default]
    Stdin,
    /// A named file, read start to end.
    File(PathBuf),
}

/// Where trace diagnostics are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceTarget {
    /// The process's standard error.
    Stderr,
    /// A named file, truncated at startup.
    File(PathBuf),
}

/// Configuration for one dispatcher run.
///
/// ## Field semantics
/// - `slot_spec`: textual slot specification (`"2,4*fast:~/w,slow"`);
///   `None` falls back to [`SLOTS_ENV`], then to CPU-count local slots
/// - `continue_on_error`: keep admitting lines after a job fails
///   (the aggregate status is still non-success)
/// - `verbose`: echo per-job lifecycle to the trace sink
/// - `skip_probe`: assume every remote host is reachable
/// - `sync_workdirs`: best-effort mirror of `sync_source` to every remote
///   working directory before the run, and back after
/// - `ssh_program`: remote launcher executable (overridable for tests)
#[derive(Clone, Debug)]
pub struct Config {
    /// Slot specification string, if given explicitly.
    pub slot_spec: Option<String>,

    /// Keep admitting input lines after a job exits nonzero.
    pub continue_on_error: bool,

    /// Echo job lifecycle diagnostics to the trace sink.
    pub verbose: bool,

    /// Skip the remote reachability probe.
    pub skip_probe: bool,

    /// Source of input lines.
    pub input: InputSource,

    /// Trace sink, if any.
    pub trace: Option<TraceTarget>,

    /// Mirror working directories around the run (best-effort).
    pub sync_workdirs: bool,

    /// Local tree pushed to / pulled from remote working directories.
    pub sync_source: PathBuf,

    /// Program used to reach remote slots.
    pub ssh_program: String,

    /// Capacity of the event bus ring buffer (min 1, clamped by the bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Resolves the slot specification, consulting [`SLOTS_ENV`].
    ///
    /// Returns `None` when neither the config nor the environment provides
    /// one; the slot table then defaults to CPU-count local slots.
    pub fn effective_slot_spec(&self) -> Option<String> {
        if let Some(spec) = &self.slot_spec {
            return Some(spec.clone());
        }
        std::env::var(SLOTS_ENV).ok().filter(|s| !s.is_empty())
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - slots from [`SLOTS_ENV`] or CPU count
    /// - halt admission on the first job failure
    /// - probe remote hosts, no workdir sync, no trace
    /// - `ssh` as the remote launcher
    fn default() -> Self {
        Self {
            slot_spec: None,
            continue_on_error: false,
            verbose: false,
            skip_probe: false,
            input: InputSource::Stdin,
            trace: None,
            sync_workdirs: false,
            sync_source: PathBuf::from("."),
            ssh_program: "ssh".to_string(),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_spec_wins_over_env() {
        let cfg = Config {
            slot_spec: Some("3".into()),
            ..Config::default()
        };
        assert_eq!(cfg.effective_slot_spec().as_deref(), Some("3"));
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
