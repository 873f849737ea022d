//! Command-line entry point.
//!
//! Flag walk in the classic single-dash style; the first token that is not
//! a flag starts the command template. Everything here is sugar over
//! [`Config`] — the engine lives in the library.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use jobfan::{
    Bus, Config, Dispatcher, Escalation, InputSource, LineSource, RuntimeError, SlotTable,
    Subscribe, SubscriberSet, SyncDirection, TraceTarget, TraceWriter, default_entries, exit,
    install_signals, mirror_workdirs, parse_spec, probe_hosts, validate_sync,
};

fn usage() {
    eprintln!("Usage: jobfan [options] [command [args...]]");
    eprintln!("Run one job per input line, line appended as the final argument.");
    eprintln!();
    eprintln!("  -j <spec>   slot specification, e.g. '2,4*crunch:~/work,slow'");
    eprintln!("              (default: ${} or one slot per CPU)", jobfan::SLOTS_ENV);
    eprintln!("  -i <file>   read lines from <file> instead of stdin");
    eprintln!("  -t <out>    trace job control to <out> ('-' for stderr)");
    eprintln!("  -v          trace to stderr (same as -t -)");
    eprintln!("  -k          keep admitting lines after a job fails");
    eprintln!("  -n          skip the remote reachability probe");
    eprintln!("  -s          mirror working directories around the run");
    eprintln!("  -h          this help");
}

fn bad_arg(arg: &str) -> ExitCode {
    eprintln!("jobfan: bad argument: '{arg}'");
    usage();
    ExitCode::from(exit::SPEC as u8)
}

fn missing_arg(arg: &str) -> ExitCode {
    eprintln!("jobfan: missing parameter to argument: '{arg}'");
    usage();
    ExitCode::from(exit::SPEC as u8)
}

/// Parsed command line: the run configuration plus the command template.
struct Invocation {
    cfg: Config,
    command: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<Invocation, ExitCode> {
    let mut cfg = Config::default();
    let mut i = 0;

    // A flag parameter may be attached (`-j2`) or the next token (`-j 2`).
    let param = |args: &[String], i: &mut usize, attached: &str| -> Option<String> {
        if !attached.is_empty() {
            return Some(attached.to_string());
        }
        *i += 1;
        args.get(*i).cloned()
    };

    while i < args.len() && args[i].starts_with('-') && args[i].len() > 1 {
        let arg = args[i].clone();
        let Some((flag, attached)) = arg.split_at_checked(2) else {
            return Err(bad_arg(&arg));
        };
        match flag {
            "-j" => match param(args, &mut i, attached) {
                Some(spec) => cfg.slot_spec = Some(spec),
                None => return Err(missing_arg(&arg)),
            },
            "-i" => match param(args, &mut i, attached) {
                Some(path) => cfg.input = InputSource::File(PathBuf::from(path)),
                None => return Err(missing_arg(&arg)),
            },
            "-t" => match param(args, &mut i, attached) {
                Some(out) if out == "-" => cfg.trace = Some(TraceTarget::Stderr),
                Some(out) => cfg.trace = Some(TraceTarget::File(PathBuf::from(out))),
                None => return Err(missing_arg(&arg)),
            },
            "-v" if attached.is_empty() => cfg.verbose = true,
            "-k" if attached.is_empty() => cfg.continue_on_error = true,
            "-n" if attached.is_empty() => cfg.skip_probe = true,
            "-s" if attached.is_empty() => cfg.sync_workdirs = true,
            "-h" if attached.is_empty() => {
                usage();
                return Err(ExitCode::from(exit::OK as u8));
            }
            _ => return Err(bad_arg(&arg)),
        }
        i += 1;
    }

    Ok(Invocation {
        cfg,
        command: args[i..].to_vec(),
    })
}

fn trace_writer(cfg: &Config) -> std::io::Result<Option<TraceWriter>> {
    match (&cfg.trace, cfg.verbose) {
        (Some(TraceTarget::Stderr), _) | (None, true) => Ok(Some(TraceWriter::stderr())),
        (Some(TraceTarget::File(path)), _) => Ok(Some(TraceWriter::file(path)?)),
        (None, false) => Ok(None),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(inv) => inv,
        Err(code) => return code,
    };
    let cfg = invocation.cfg;

    let entries = match cfg.effective_slot_spec() {
        Some(spec) => match parse_spec(&spec) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("jobfan: slot spec: {e}");
                return ExitCode::from(exit::SPEC as u8);
            }
        },
        None => default_entries(),
    };

    let mut table = SlotTable::build(&entries, &invocation.command, &cfg);
    if cfg.sync_workdirs {
        if let Err(e) = validate_sync(&table) {
            eprintln!("jobfan: {e}");
            return ExitCode::from(exit::SPEC as u8);
        }
    }

    let bus = Bus::new(cfg.bus_capacity_clamped());
    let listener = match trace_writer(&cfg) {
        Ok(Some(writer)) => {
            let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(writer)];
            Some(SubscriberSet::new(subs).spawn_listener(&bus))
        }
        Ok(None) => None,
        Err(e) => {
            eprintln!("jobfan: cannot open trace file: {e}");
            return ExitCode::from(exit::SPEC as u8);
        }
    };

    probe_hosts(&mut table, &cfg, &bus).await;
    if cfg.sync_workdirs {
        mirror_workdirs(&table, &cfg, &bus, SyncDirection::Push).await;
    }

    let escalation = Escalation::new();
    let signal_task = install_signals(&escalation);

    let mut lines = match LineSource::from_config(&cfg.input).await {
        Ok(src) => src,
        Err(e) => {
            eprintln!("jobfan: cannot open input: {e}");
            return ExitCode::from(exit::SPEC as u8);
        }
    };

    let mut dispatcher = Dispatcher::new(cfg.clone(), table, bus.clone(), escalation);
    let code = match dispatcher.run(&mut lines).await {
        Ok(report) => {
            if cfg.sync_workdirs {
                mirror_workdirs(dispatcher.table(), &cfg, &bus, SyncDirection::Pull).await;
            }
            if report.success() {
                exit::OK
            } else {
                exit::JOB_FAILURE
            }
        }
        Err(RuntimeError::NoUsableSlots { total }) => {
            eprintln!("jobfan: no usable slots: all {total} slots are faulted");
            exit::JOB_FAILURE
        }
        Err(e) => {
            eprintln!("jobfan: fatal: {e}");
            exit::INTERNAL
        }
    };

    // Flush diagnostics: close the bus and wait for the listener.
    signal_task.abort();
    drop(dispatcher);
    drop(bus);
    if let Some(listener) = listener {
        let _ = listener.await;
    }

    ExitCode::from(code as u8)
}
