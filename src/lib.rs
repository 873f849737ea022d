//! # jobfan
//!
//! **jobfan** distributes a stream of input lines across a bounded pool of
//! execution slots — local processes or remote hosts reached through a
//! secure-shell launcher — running one job per line with a shared command
//! template. Each line becomes exactly one argument: whitespace inside it
//! is never re-split locally.
//!
//! ## Architecture
//! ```text
//!  "2,4*crunch:~/work,slow"          find . -name '*.raw' | ...
//!          │                                   │
//!          ▼                                   ▼
//!   ┌─────────────┐   ┌───────────┐   ┌──────────────┐
//!   │ spec parser │──►│ SlotTable │   │  LineSource  │
//!   └─────────────┘   └─────┬─────┘   └──────┬───────┘
//!                           │ probe faults   │ lines
//!                           ▼                ▼
//!   ┌───────────────────────────────────────────────────────┐
//!   │  Dispatcher (single control task)                     │
//!   │  - admission: lowest-index Idle slot wins             │
//!   │  - launcher: argv = base_argv + line (escaped remote) │
//!   │  - reaper: wait-for-any, slot Busy → Idle             │
//!   │  - observes Escalation{drain, force} at check points  │
//!   └──────┬────────────────────────────────────────────────┘
//!          │ events                          children (stdin: null)
//!          ▼                                 stdout/stderr: inherited
//!   ┌──────────────┐
//!   │ Bus ─► subs  │  TraceWriter, custom Subscribe impls
//!   └──────────────┘
//! ```
//!
//! ## Semantics
//! - **Priority**: slot order is the spec entry order; among Idle slots
//!   the lowest index always wins, so earlier-declared slots saturate
//!   first.
//! - **Bounded concurrency**: at most `len(table) − faulted` jobs run at
//!   once; at capacity the dispatcher blocks on wait-for-any.
//! - **Failure isolation**: an unreachable host quarantines its slots; a
//!   failed spawn or nonzero exit marks the run failed without crashing
//!   it; by default admission halts after the first failure
//!   ([`Config::continue_on_error`] keeps going).
//! - **Escalation**: the first interrupt drains (running jobs finish),
//!   the second signals every running child directly.
//!
//! ## Example
//! ```no_run
//! use jobfan::{
//!     Bus, Config, Dispatcher, Escalation, LineSource, SlotTable, parse_spec,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let entries = parse_spec("2")?;
//!     let command = vec!["bzip2".to_string(), "-9".to_string()];
//!     let table = SlotTable::build(&entries, &command, &cfg);
//!
//!     let bus = Bus::new(cfg.bus_capacity_clamped());
//!     let mut dispatcher = Dispatcher::new(cfg, table, bus.clone(), Escalation::new());
//!
//!     let mut lines = LineSource::stdin();
//!     let report = dispatcher.run(&mut lines).await?;
//!     std::process::exit(if report.success() { 0 } else { 1 });
//! }
//! ```

mod config;
mod dispatch;
mod error;
mod events;
mod exec;
mod input;
mod probe;
mod signals;
mod slots;
mod subscribers;
mod sync;

// ---- Public re-exports ----

pub use config::{Config, InputSource, SLOTS_ENV, TraceTarget};
pub use dispatch::{Dispatcher, InterruptStage, RunReport, RunState};
pub use error::{RuntimeError, SpecError, exit};
pub use events::{Bus, Event, EventKind};
pub use exec::{job_argv, shell_escape};
pub use input::LineSource;
pub use probe::probe_hosts;
pub use signals::{Escalation, install as install_signals};
pub use slots::{Slot, SlotEntry, SlotKind, SlotState, SlotTable, default_entries, parse_spec};
pub use subscribers::{Subscribe, SubscriberSet};
pub use sync::{Direction as SyncDirection, mirror as mirror_workdirs, validate as validate_sync};

#[cfg(feature = "logging")]
pub use subscribers::TraceWriter;
