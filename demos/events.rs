//! # Demo: a custom subscriber watching the run.
//!
//! Run with: cargo run --example events

use std::sync::Arc;

use async_trait::async_trait;
use jobfan::{
    Bus, Config, Dispatcher, Escalation, Event, EventKind, LineSource, SlotTable, Subscribe,
    SubscriberSet, parse_spec,
};

/// Counts terminal job events.
struct Meter;

#[async_trait]
impl Subscribe for Meter {
    async fn on_event(&self, event: &Event) {
        match event.kind {
            EventKind::JobStopped => println!("ok: {:?}", event.line.as_deref()),
            EventKind::JobFailed => println!(
                "failed (code {:?}): {:?}",
                event.code,
                event.line.as_deref()
            ),
            EventKind::AllDrained => println!("all drained"),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "meter"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        continue_on_error: true,
        ..Config::default()
    };
    let entries = parse_spec("2")?;
    // `sh -c 'exit "$0"'`: the line decides the exit code.
    let command = vec!["sh".to_string(), "-c".to_string(), "exit \"$0\"".to_string()];
    let table = SlotTable::build(&entries, &command, &cfg);

    let bus = Bus::new(cfg.bus_capacity_clamped());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Meter)];
    let listener = SubscriberSet::new(subs).spawn_listener(&bus);

    let mut dispatcher = Dispatcher::new(cfg, table, bus.clone(), Escalation::new());
    let mut lines = LineSource::from_reader(std::io::Cursor::new(b"0\n1\n0\n".to_vec()));
    let report = dispatcher.run(&mut lines).await?;

    drop(dispatcher);
    drop(bus);
    listener.await?;

    println!("failed={} success={}", report.failed, report.success());
    Ok(())
}
