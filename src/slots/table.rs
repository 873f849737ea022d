//! # The slot table.
//!
//! [`SlotTable`] is the ordered, fixed-for-the-run collection of slots and
//! their live state. It is built once from the parsed spec entries and the
//! command, then owned and mutated exclusively by the dispatcher (the
//! prober faults slots before the first dispatch).
//!
//! ## Invariants
//! - Slot order never changes after build; index is dispatch priority.
//! - `busy + faulted <= len` at all times; the admission bound is
//!   `busy <= len - faulted`.
//! - `Faulted` is terminal: a faulted slot never becomes Busy again.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::exec;

use super::slot::{Slot, SlotKind, SlotState};
use super::spec::SlotEntry;

/// Ordered slot records for one run.
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    /// Expands spec entries into a table, baking each slot's launch prefix.
    ///
    /// Local working directories get `~` expanded against the invoking
    /// user's home directory; remote working directories stay literal
    /// remote-side paths.
    pub fn build(entries: &[SlotEntry], command: &[String], cfg: &Config) -> Self {
        let mut slots = Vec::new();
        for entry in entries {
            for _ in 0..entry.count {
                let index = slots.len();
                let kind = match &entry.host {
                    None => SlotKind::Local,
                    Some(h) => SlotKind::Remote {
                        host: Arc::from(h.as_str()),
                    },
                };
                let workdir = match (&kind, &entry.workdir) {
                    (SlotKind::Local, Some(dir)) => Some(expand_home(dir)),
                    (_, dir) => dir.clone(),
                };
                let base_argv =
                    exec::base_argv(&kind, workdir.as_deref(), command, &cfg.ssh_program);
                slots.push(Slot {
                    index,
                    kind,
                    workdir,
                    base_argv,
                    state: SlotState::Idle,
                });
            }
        }
        Self { slots }
    }

    /// Number of slots (fixed for the run).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, in dispatch-priority order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Borrows one slot.
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Mutably borrows one slot (dispatcher/prober only).
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Slots currently running a job.
    pub fn busy_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_busy()).count()
    }

    /// Slots quarantined by the probe.
    pub fn faulted_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_faulted()).count()
    }

    /// True when no further job can be admitted right now.
    pub fn at_capacity(&self) -> bool {
        self.busy_count() + self.faulted_count() >= self.slots.len()
    }

    /// Lowest-index Idle slot: the dispatch-priority rule.
    pub fn first_idle(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_idle())
    }

    /// Remote hosts in first-occurrence order, deduplicated by exact
    /// string equality (the probe's iteration order).
    pub fn remote_hosts(&self) -> Vec<Arc<str>> {
        let mut seen = HashSet::new();
        let mut hosts = Vec::new();
        for slot in &self.slots {
            if let SlotKind::Remote { host } = &slot.kind {
                if seen.insert(host.clone()) {
                    hosts.push(host.clone());
                }
            }
        }
        hosts
    }

    /// Faults every Idle slot on `host`; returns how many were faulted.
    ///
    /// Only the prober calls this, before any dispatch, so every affected
    /// slot is still Idle.
    pub fn mark_faulted(&mut self, host: &str) -> usize {
        let mut marked = 0;
        for slot in &mut self.slots {
            if let SlotKind::Remote { host: h } = &slot.kind {
                if h.as_ref() == host && slot.is_idle() {
                    slot.state = SlotState::Faulted;
                    marked += 1;
                }
            }
        }
        marked
    }
}

/// Expands a leading `~`/`~/` against `$HOME`; other values pass through.
fn expand_home(dir: &str) -> String {
    if dir == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return home;
        }
    } else if let Some(rest) = dir.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    dir.to_string()
}
