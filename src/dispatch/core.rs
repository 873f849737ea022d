//! # Dispatcher: the admission/dispatch/reap control loop.
//!
//! The [`Dispatcher`] owns the slot table and the run state for exactly
//! one run. It is single-threaded and cooperative: admission, launching,
//! and reaping all happen on the control task, so the slot table needs no
//! locks. The only suspension points are (a) waiting for a free slot at
//! capacity and (b) the final drain after input exhaustion — both block on
//! "wait for any child".
//!
//! ## Control flow
//! ```text
//! loop {
//!   ├─► observe drain token / error policy   (admission check point)
//!   ├─► read next line (None → drain & exit)
//!   ├─► while busy + faulted ≥ len: reap one  (wait-for-any)
//!   ├─► pick lowest-index Idle slot           (strict priority)
//!   └─► launch: slot → Busy{pid, line}, child into the reap set
//! }
//! drain: while busy > 0: reap one
//! ```
//!
//! ## Rules
//! - Jobs are admitted in input order; among free slots the lowest index
//!   always wins.
//! - A faulted slot is never picked; it still occupies capacity.
//! - The forced cancellation stage is observed while blocked on the reap
//!   set: every Busy child is signalled directly, then reaped as usual.
//! - Bookkeeping contradictions (no Idle slot despite capacity, a reaped
//!   child with no owning Busy slot) are fatal invariant violations.

use std::process::ExitStatus;

use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::exec;
use crate::input::LineSource;
use crate::signals::Escalation;
use crate::slots::{SlotKind, SlotState, SlotTable};

use super::state::{InterruptStage, RunReport, RunState};

/// Distinguishing status recorded when a child could not be spawned.
const SPAWN_FAILURE_CODE: i32 = 127;

/// The slot-scheduling and dispatch engine for one run.
pub struct Dispatcher {
    cfg: Config,
    table: SlotTable,
    bus: Bus,
    escalation: Escalation,
    state: RunState,
    jobs: JoinSet<(usize, std::io::Result<ExitStatus>)>,
    force_delivered: bool,
}

impl Dispatcher {
    /// Creates a dispatcher over an already-built (and probed) table.
    pub fn new(cfg: Config, table: SlotTable, bus: Bus, escalation: Escalation) -> Self {
        Self {
            cfg,
            table,
            bus,
            escalation,
            state: RunState::default(),
            jobs: JoinSet::new(),
            force_delivered: false,
        }
    }

    /// The slot table (read-only; the dispatcher owns mutation).
    pub fn table(&self) -> &SlotTable {
        &self.table
    }

    /// Runs the admission loop until input is exhausted or admission
    /// halts, then drains every Busy slot. One run per dispatcher.
    pub async fn run(&mut self, lines: &mut LineSource) -> Result<RunReport, RuntimeError> {
        loop {
            self.observe_drain();
            if !self.state.admission_open(self.cfg.continue_on_error) {
                break;
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };

            while self.table.at_capacity() {
                if self.table.busy_count() == 0 {
                    // Capacity is exhausted by faults alone; nothing can
                    // ever run.
                    return Err(RuntimeError::NoUsableSlots {
                        total: self.table.len(),
                    });
                }
                self.reap_one().await?;
            }
            self.admit(line)?;
        }

        while self.table.busy_count() > 0 {
            self.reap_one().await?;
        }

        self.bus.publish(Event::now(EventKind::AllDrained));
        Ok(RunReport {
            launched: self.state.launched,
            failed: self.state.failed,
            faulted_slots: self.table.faulted_count(),
            interrupt: self.state.interrupt,
        })
    }

    /// Admission check point: notes stage-one cancellation exactly once.
    fn observe_drain(&mut self) {
        if self.state.interrupt == InterruptStage::None && self.escalation.drain.is_cancelled() {
            self.state.interrupt = InterruptStage::Draining;
            self.bus.publish(Event::now(EventKind::DrainRequested));
        }
    }

    /// Assigns `line` to the lowest-index Idle slot and launches it.
    fn admit(&mut self, line: String) -> Result<(), RuntimeError> {
        let index = self.table.first_idle().ok_or_else(|| {
            RuntimeError::invariant(format!(
                "no idle slot though capacity arithmetic allows one (busy={} faulted={} len={})",
                self.table.busy_count(),
                self.table.faulted_count(),
                self.table.len()
            ))
        })?;

        let slot = self.table.slot(index).ok_or_else(|| {
            RuntimeError::invariant(format!("idle scan produced out-of-range slot {index}"))
        })?;
        let argv = exec::job_argv(slot, &line);
        let workdir = match &slot.kind {
            SlotKind::Local => slot.workdir.as_deref().map(std::path::Path::new),
            SlotKind::Remote { .. } => None,
        };

        self.bus.publish(
            Event::now(EventKind::JobStarting)
                .with_slot(index)
                .with_host(slot.kind.host_label().to_string())
                .with_line(line.as_str()),
        );

        let pid = match exec::spawn_job(&argv, workdir) {
            Ok(mut child) => {
                let pid = child.id();
                self.jobs
                    .spawn(async move { (index, child.wait().await) });
                pid
            }
            Err(e) => {
                // Fatal only to this job: reaped like any other failure,
                // with a distinguishing status.
                self.jobs.spawn(async move { (index, Err(e)) });
                None
            }
        };

        let slot = self.table.slot_mut(index).ok_or_else(|| {
            RuntimeError::invariant(format!("idle scan produced out-of-range slot {index}"))
        })?;
        slot.state = SlotState::Busy { pid, line };
        self.state.launched += 1;
        Ok(())
    }

    /// Blocks until any child terminates, then updates its slot.
    ///
    /// While blocked, also observes the stage-two token: on force, every
    /// Busy child is signalled directly and reaping continues.
    async fn reap_one(&mut self) -> Result<(), RuntimeError> {
        let force = self.escalation.force.clone();
        loop {
            tokio::select! {
                biased;

                _ = force.cancelled(), if !self.force_delivered => {
                    self.force_delivered = true;
                    self.state.interrupt = InterruptStage::Forcing;
                    self.bus.publish(Event::now(EventKind::ForceRequested));
                    self.signal_busy();
                }

                joined = self.jobs.join_next() => {
                    let Some(joined) = joined else {
                        return Err(RuntimeError::invariant(
                            "waiting for a child with none running",
                        ));
                    };
                    let (index, outcome) = joined.map_err(|e| {
                        RuntimeError::invariant(format!("reap task failed: {e}"))
                    })?;
                    return self.finish(index, outcome);
                }
            }
        }
    }

    /// Releases a terminated job's slot and records its outcome.
    fn finish(
        &mut self,
        index: usize,
        outcome: std::io::Result<ExitStatus>,
    ) -> Result<(), RuntimeError> {
        let slot = self.table.slot_mut(index).ok_or_else(|| {
            RuntimeError::invariant(format!("terminated child reports unknown slot {index}"))
        })?;

        let line = match std::mem::replace(&mut slot.state, SlotState::Idle) {
            SlotState::Busy { line, .. } => line,
            other => {
                let detail = format!(
                    "terminated child has no owning busy slot (slot {index} was {other:?})"
                );
                slot.state = other;
                return Err(RuntimeError::invariant(detail));
            }
        };
        let host = slot.kind.host_label().to_string();

        let (code, reason) = match outcome {
            Ok(status) => (exit_code(&status), None),
            Err(e) => (SPAWN_FAILURE_CODE, Some(format!("launch failed: {e}"))),
        };

        if code == 0 {
            self.bus.publish(
                Event::now(EventKind::JobStopped)
                    .with_slot(index)
                    .with_host(host)
                    .with_line(line.as_str()),
            );
        } else {
            self.state.error_encountered = true;
            self.state.failed += 1;
            let mut ev = Event::now(EventKind::JobFailed)
                .with_slot(index)
                .with_host(host)
                .with_line(line.as_str())
                .with_code(code);
            if let Some(reason) = reason {
                ev = ev.with_reason(reason);
            }
            self.bus.publish(ev);
        }
        Ok(())
    }

    /// Delivers the interrupt directly to every Busy child.
    fn signal_busy(&self) {
        for slot in self.table.slots() {
            if let SlotState::Busy { pid: Some(pid), .. } = slot.state {
                exec::interrupt(pid);
            }
        }
    }
}

#[cfg(unix)]
fn exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::parse_spec;

    fn build(spec: &str, command: &[&str], cfg: Config) -> (Dispatcher, Bus) {
        let command: Vec<String> = command.iter().map(|s| s.to_string()).collect();
        let table = SlotTable::build(&parse_spec(spec).unwrap(), &command, &cfg);
        let bus = Bus::new(256);
        let dispatcher = Dispatcher::new(cfg, table, bus.clone(), Escalation::new());
        (dispatcher, bus)
    }

    fn lines(input: &str) -> LineSource {
        LineSource::from_reader(std::io::Cursor::new(input.as_bytes().to_vec()))
    }

    fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn five_lines_two_slots_each_line_exactly_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("seen");
        let script = format!("printf '%s\\n' \"$0\" >> {}", out.display());
        let (mut dispatcher, _bus) = build("2", &["sh", "-c", &script], Config::default());

        let mut src = lines("alpha\nbeta\ngamma\ndelta\nepsilon\n");
        let report = dispatcher.run(&mut src).await.expect("run");

        assert_eq!(report.launched, 5);
        assert_eq!(report.failed, 0);
        assert!(report.success());

        let mut seen: Vec<String> = std::fs::read_to_string(&out)
            .expect("out file")
            .lines()
            .map(String::from)
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["alpha", "beta", "delta", "epsilon", "gamma"]);
    }

    #[tokio::test]
    async fn lowest_index_idle_slot_always_wins() {
        let (mut dispatcher, bus) = build("2", &["true"], Config::default());
        let mut rx = bus.subscribe();
        let report = dispatcher.run(&mut lines("only\n")).await.expect("run");
        assert_eq!(report.launched, 1);

        let events = drain_events(&mut rx);
        let starting: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::JobStarting)
            .collect();
        assert_eq!(starting.len(), 1);
        assert_eq!(starting[0].slot, Some(0));
    }

    #[tokio::test]
    async fn faulted_slots_are_never_dispatched() {
        let cfg = Config::default();
        let command = vec!["true".to_string()];
        let mut table = SlotTable::build(
            &parse_spec("dead.example,1").unwrap(),
            &command,
            &cfg,
        );
        table.mark_faulted("dead.example");
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let mut dispatcher = Dispatcher::new(cfg, table, bus.clone(), Escalation::new());

        let report = dispatcher.run(&mut lines("a\nb\n")).await.expect("run");
        assert_eq!(report.launched, 2);
        assert_eq!(report.faulted_slots, 1);

        for ev in drain_events(&mut rx) {
            if ev.kind == EventKind::JobStarting {
                assert_eq!(ev.slot, Some(1), "faulted slot 0 must never launch");
            }
        }
    }

    #[tokio::test]
    async fn default_policy_halts_admission_after_failure() {
        let (mut dispatcher, _bus) = build("1", &["false"], Config::default());
        let report = dispatcher
            .run(&mut lines("a\nb\nc\n"))
            .await
            .expect("run");
        // Line b was already read when a's failure surfaced at the
        // capacity wait; c is never admitted.
        assert_eq!(report.launched, 2);
        assert_eq!(report.failed, 2);
        assert!(!report.success());
    }

    #[tokio::test]
    async fn continue_on_error_keeps_admitting() {
        let cfg = Config {
            continue_on_error: true,
            ..Config::default()
        };
        let (mut dispatcher, _bus) = build("1", &["false"], cfg);
        let report = dispatcher
            .run(&mut lines("a\nb\nc\n"))
            .await
            .expect("run");
        assert_eq!(report.launched, 3);
        assert_eq!(report.failed, 3);
        assert!(!report.success());
    }

    #[tokio::test]
    async fn spawn_failure_is_contained_to_its_job() {
        let cfg = Config {
            continue_on_error: true,
            ..Config::default()
        };
        let (mut dispatcher, bus) = build("1", &["/nonexistent/not-a-program"], cfg);
        let mut rx = bus.subscribe();
        let report = dispatcher.run(&mut lines("a\nb\n")).await.expect("run");
        assert_eq!(report.launched, 2);
        assert_eq!(report.failed, 2);

        let events = drain_events(&mut rx);
        let failed: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::JobFailed)
            .collect();
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|e| e.code == Some(127)));
        assert!(failed.iter().all(|e| e.reason.is_some()));
    }

    #[tokio::test]
    async fn drain_token_stops_admission_before_any_launch() {
        let (mut dispatcher, bus) = build("2", &["true"], Config::default());
        dispatcher.escalation.drain.cancel();
        let mut rx = bus.subscribe();
        let report = dispatcher.run(&mut lines("a\nb\n")).await.expect("run");
        assert_eq!(report.launched, 0);
        assert_eq!(report.interrupt, InterruptStage::Draining);

        let kinds: Vec<EventKind> = drain_events(&mut rx).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::DrainRequested, EventKind::AllDrained]);
    }

    #[tokio::test]
    async fn force_signals_running_jobs_directly() {
        let (mut dispatcher, _bus) = build("2", &["sleep"], Config::default());
        let esc = dispatcher.escalation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            esc.drain.cancel();
            esc.force.cancel();
        });

        let started = std::time::Instant::now();
        let report = dispatcher.run(&mut lines("30\n30\n")).await.expect("run");
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
        assert_eq!(report.launched, 2);
        assert_eq!(report.interrupt, InterruptStage::Forcing);
        // SIGINT-terminated children count as failures (128 + signal).
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn all_slots_faulted_is_reported_not_hung() {
        let cfg = Config::default();
        let command = vec!["true".to_string()];
        let mut table = SlotTable::build(&parse_spec("dead.example").unwrap(), &command, &cfg);
        table.mark_faulted("dead.example");
        let bus = Bus::new(16);
        let mut dispatcher = Dispatcher::new(cfg, table, bus, Escalation::new());

        let err = dispatcher.run(&mut lines("a\n")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::NoUsableSlots { total: 1 }));
    }

    #[tokio::test]
    async fn empty_command_executes_the_line_itself() {
        let cfg = Config {
            continue_on_error: true,
            ..Config::default()
        };
        let (mut dispatcher, _bus) = build("1", &[], cfg);
        let report = dispatcher
            .run(&mut lines("true\nfalse\n"))
            .await
            .expect("run");
        assert_eq!(report.launched, 2);
        assert_eq!(report.failed, 1);
    }
}
