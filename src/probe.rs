//! # Remote reachability probe.
//!
//! Before the first dispatch, every distinct remote host is checked with a
//! minimal no-op command through the secure-shell launcher. A host that
//! fails its probe gets **every** slot on it quarantined; the run then
//! proceeds with reduced concurrency.
//!
//! ## Rules
//! - Deduplication is by exact host-string equality, first occurrence
//!   wins; a host is probed at most once per run.
//! - Probing is host-level only; working-directory validity (see
//!   [`validate_sync`](crate::validate_sync)) is a separate
//!   (host, dir)-level concern.
//! - A probe failure is isolated to the affected slots, never fatal.
//! - Skippable via [`Config::skip_probe`](crate::Config::skip_probe)
//!   (reachability assumed).

use std::process::Stdio;

use tokio::process::Command;

use crate::config::Config;
use crate::events::{Bus, Event, EventKind};
use crate::slots::SlotTable;

/// Probes every distinct remote host and faults unreachable slots.
///
/// Returns the number of slots faulted.
pub async fn probe_hosts(table: &mut SlotTable, cfg: &Config, bus: &Bus) -> usize {
    if cfg.skip_probe {
        return 0;
    }

    let mut faulted = 0;
    for host in table.remote_hosts() {
        if let Err(reason) = probe_one(&cfg.ssh_program, &host).await {
            faulted += table.mark_faulted(&host);
            bus.publish(
                Event::now(EventKind::SlotFaulted)
                    .with_host(host.clone())
                    .with_reason(reason),
            );
        }
    }
    faulted
}

/// Runs one connectivity check: `<ssh> <host> true`, stdin detached.
async fn probe_one(ssh_program: &str, host: &str) -> Result<(), String> {
    let child = Command::new(ssh_program)
        .arg(host)
        .arg("true")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match child {
        Ok(c) => c,
        Err(e) => return Err(format!("probe spawn failed: {e}")),
    };

    match child.wait().await {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(match status.code() {
            Some(code) => format!("probe exited with {code}"),
            None => "probe terminated by signal".to_string(),
        }),
        Err(e) => Err(format!("probe wait failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::parse_spec;

    fn table_for(spec: &str, cfg: &Config) -> SlotTable {
        SlotTable::build(
            &parse_spec(spec).unwrap(),
            &["echo".to_string()],
            cfg,
        )
    }

    fn cfg_with_ssh(program: &str) -> Config {
        Config {
            ssh_program: program.to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn failing_probe_faults_every_slot_on_the_host() {
        // `false host true` exits 1 regardless of arguments.
        let cfg = cfg_with_ssh("false");
        let mut table = table_for("a.example,2*a.example,b.example,1", &cfg);
        let bus = Bus::new(16);
        let faulted = probe_hosts(&mut table, &cfg, &bus).await;
        assert_eq!(faulted, 4);
        assert_eq!(table.faulted_count(), 4);
        // The local slot survives.
        assert_eq!(table.first_idle(), Some(4));
    }

    #[tokio::test]
    async fn passing_probe_leaves_slots_idle() {
        let cfg = cfg_with_ssh("true");
        let mut table = table_for("a.example,b.example", &cfg);
        let bus = Bus::new(16);
        assert_eq!(probe_hosts(&mut table, &cfg, &bus).await, 0);
        assert_eq!(table.faulted_count(), 0);
    }

    #[tokio::test]
    async fn unspawnable_probe_counts_as_unreachable() {
        let cfg = cfg_with_ssh("/nonexistent/ssh-surely-missing");
        let mut table = table_for("a.example", &cfg);
        let bus = Bus::new(16);
        assert_eq!(probe_hosts(&mut table, &cfg, &bus).await, 1);
    }

    #[tokio::test]
    async fn skip_probe_leaves_table_untouched() {
        let cfg = Config {
            skip_probe: true,
            ssh_program: "false".to_string(),
            ..Config::default()
        };
        let mut table = table_for("a.example", &cfg);
        let bus = Bus::new(16);
        assert_eq!(probe_hosts(&mut table, &cfg, &bus).await, 0);
        assert_eq!(table.faulted_count(), 0);
    }

    #[tokio::test]
    async fn fault_event_names_the_host() {
        let cfg = cfg_with_ssh("false");
        let mut table = table_for("dead.example", &cfg);
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        probe_hosts(&mut table, &cfg, &bus).await;
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::SlotFaulted);
        assert_eq!(ev.host.as_deref(), Some("dead.example"));
        assert!(ev.reason.is_some());
    }
}
