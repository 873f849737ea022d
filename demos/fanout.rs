//! # Demo: fan a few lines out over two local slots.
//!
//! Run with: cargo run --example fanout

use jobfan::{Bus, Config, Dispatcher, Escalation, LineSource, SlotTable, parse_spec};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::default();
    let entries = parse_spec("2")?;

    // Each input line lands as the final argument of `sh -c 'sleep ...'`.
    let command = vec![
        "sh".to_string(),
        "-c".to_string(),
        "echo \"job $0 starts\"; sleep \"$0\"; echo \"job $0 done\"".to_string(),
    ];
    let table = SlotTable::build(&entries, &command, &cfg);

    let bus = Bus::new(cfg.bus_capacity_clamped());
    let mut dispatcher = Dispatcher::new(cfg, table, bus.clone(), Escalation::new());

    // Five durations, two slots: never more than two sleeps at once.
    let mut lines = LineSource::from_reader(std::io::Cursor::new(
        b"1\n2\n1\n1\n2\n".to_vec(),
    ));
    let report = dispatcher.run(&mut lines).await?;

    println!(
        "launched={} failed={} success={}",
        report.launched,
        report.failed,
        report.success()
    );
    Ok(())
}
