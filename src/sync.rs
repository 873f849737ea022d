//! # Working-directory synchronization (best-effort extension).
//!
//! An optional wrapper around the whole run: push a local tree to every
//! declared remote working directory before dispatching, pull it back
//! after the drain. This is **not** a per-job contract — there is no
//! deletion policy and no conflict resolution, and any copy failure is a
//! diagnostic, never fatal.
//!
//! ## Preconditions (checked before the run, fatal as a [`SpecError`])
//! - Every slot declares a working directory.
//! - (host, dir) pairs are unique across the table. The key here is the
//!   pair — reachability (see [`probe_hosts`](crate::probe_hosts)) dedups
//!   by host alone.

use std::collections::HashSet;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::Config;
use crate::error::SpecError;
use crate::events::{Bus, Event, EventKind};
use crate::slots::{SlotKind, SlotTable};

/// Copy direction for one mirror pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Local tree → remote working directories (pre-run).
    Push,
    /// Remote working directories → local tree (post-run).
    Pull,
}

/// Validates the sync preconditions over a built table.
pub fn validate(table: &SlotTable) -> Result<(), SpecError> {
    let mut pairs = HashSet::new();
    for slot in table.slots() {
        let Some(dir) = &slot.workdir else {
            return Err(SpecError::SyncWorkdirMissing { index: slot.index });
        };
        let host = slot.kind.host_label().to_string();
        if !pairs.insert((host.clone(), dir.clone())) {
            return Err(SpecError::SyncWorkdirDuplicate {
                host,
                dir: dir.clone(),
            });
        }
    }
    Ok(())
}

/// Mirrors the sync source to/from every remote (host, dir) pair.
///
/// Local slots are skipped (their tree is already local). Failures are
/// published as [`EventKind::SyncFailed`] and otherwise ignored.
pub async fn mirror(table: &SlotTable, cfg: &Config, bus: &Bus, direction: Direction) {
    let mut seen = HashSet::new();
    for slot in table.slots() {
        let SlotKind::Remote { host } = &slot.kind else {
            continue;
        };
        let Some(dir) = &slot.workdir else {
            continue;
        };
        if !seen.insert((host.clone(), dir.clone())) {
            continue;
        }
        if slot.is_faulted() {
            continue;
        }

        let local = format!("{}/", cfg.sync_source.display());
        let remote = format!("{host}:{dir}/");
        let (src, dst) = match direction {
            Direction::Push => (local, remote),
            Direction::Pull => (remote, local),
        };

        if let Err(reason) = copy_tree(&src, &dst).await {
            bus.publish(
                Event::now(EventKind::SyncFailed)
                    .with_host(host.clone())
                    .with_reason(reason),
            );
        }
    }
}

/// One `rsync -a` invocation, stdin detached.
async fn copy_tree(src: &str, dst: &str) -> Result<(), String> {
    let child = Command::new("rsync")
        .arg("-a")
        .arg("--")
        .arg(src)
        .arg(dst)
        .stdin(Stdio::null())
        .spawn();

    let mut child = match child {
        Ok(c) => c,
        Err(e) => return Err(format!("rsync spawn failed: {e}")),
    };
    match child.wait().await {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!("rsync exited with {}", status.code().unwrap_or(-1))),
        Err(e) => Err(format!("rsync wait failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::parse_spec;

    fn table(spec: &str) -> SlotTable {
        SlotTable::build(
            &parse_spec(spec).unwrap(),
            &["echo".to_string()],
            &Config::default(),
        )
    }

    #[test]
    fn all_workdirs_present_and_unique_passes() {
        let t = table("a.example:/s/one,a.example:/s/two,1*:/tmp/w");
        assert_eq!(validate(&t), Ok(()));
    }

    #[test]
    fn missing_workdir_is_rejected_with_slot_index() {
        let t = table("a.example:/s/one,2");
        assert_eq!(
            validate(&t),
            Err(SpecError::SyncWorkdirMissing { index: 1 })
        );
    }

    #[test]
    fn duplicate_host_dir_pair_is_rejected() {
        let t = table("a.example:/s/one,a.example:/s/one");
        assert!(matches!(
            validate(&t),
            Err(SpecError::SyncWorkdirDuplicate { .. })
        ));
    }

    #[test]
    fn same_dir_on_different_hosts_is_fine() {
        let t = table("a.example:/scratch,b.example:/scratch");
        assert_eq!(validate(&t), Ok(()));
    }

    #[test]
    fn multi_slot_entry_shares_one_pair() {
        // Slots expanded from one entry share (host, dir); the pair is
        // deduplicated for mirroring but duplicated for validation.
        let t = table("2*a.example:/scratch");
        assert!(matches!(
            validate(&t),
            Err(SpecError::SyncWorkdirDuplicate { .. })
        ));
    }
}
