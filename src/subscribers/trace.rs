//! # Trace writer.
//!
//! [`TraceWriter`] prints events in a compact human-readable form, one
//! record per line, to stderr or a trace file. This is the sink behind the
//! CLI's `-t`/`-v` flags.
//!
//! ## Output format
//! ```text
//! [starting] slot=0 host=local line='photos/a.raw'
//! [stopped] slot=0 host=local line='photos/a.raw'
//! [failed] slot=1 host=fast.example code=1 line='photos/b.raw'
//! [faulted] host=dead.example reason='probe exited with 255'
//! [drain] no further admissions
//! [force] signalling running jobs
//! [all-drained]
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::subscribe::Subscribe;

/// Destination for trace records.
pub enum TraceSink {
    /// Standard error.
    Stderr,
    /// An open trace file.
    File(Mutex<File>),
}

/// Line-oriented trace subscriber.
pub struct TraceWriter {
    sink: TraceSink,
}

impl TraceWriter {
    /// Traces to standard error.
    pub fn stderr() -> Self {
        Self {
            sink: TraceSink::Stderr,
        }
    }

    /// Traces to a file, truncated on open.
    pub fn file(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            sink: TraceSink::File(Mutex::new(File::create(path)?)),
        })
    }

    fn write_record(&self, record: &str) {
        match &self.sink {
            TraceSink::Stderr => eprintln!("{record}"),
            TraceSink::File(f) => {
                if let Ok(mut f) = f.lock() {
                    let _ = writeln!(f, "{record}");
                }
            }
        }
    }

    fn render(event: &Event) -> String {
        let slot = event.slot.map(|i| format!(" slot={i}")).unwrap_or_default();
        let host = event
            .host
            .as_deref()
            .map(|h| format!(" host={h}"))
            .unwrap_or_default();
        let line = event
            .line
            .as_deref()
            .map(|l| format!(" line='{l}'"))
            .unwrap_or_default();

        match event.kind {
            EventKind::JobStarting => format!("[starting]{slot}{host}{line}"),
            EventKind::JobStopped => format!("[stopped]{slot}{host}{line}"),
            EventKind::JobFailed => {
                let code = event.code.map(|c| format!(" code={c}")).unwrap_or_default();
                format!("[failed]{slot}{host}{code}{line}")
            }
            EventKind::SlotFaulted => {
                let reason = event
                    .reason
                    .as_deref()
                    .map(|r| format!(" reason='{r}'"))
                    .unwrap_or_default();
                format!("[faulted]{host}{reason}")
            }
            EventKind::DrainRequested => "[drain] no further admissions".to_string(),
            EventKind::ForceRequested => "[force] signalling running jobs".to_string(),
            EventKind::SyncFailed => {
                let reason = event
                    .reason
                    .as_deref()
                    .map(|r| format!(" reason='{r}'"))
                    .unwrap_or_default();
                format!("[sync-failed]{host}{reason}")
            }
            EventKind::AllDrained => "[all-drained]".to_string(),
        }
    }
}

#[async_trait]
impl Subscribe for TraceWriter {
    async fn on_event(&self, event: &Event) {
        self.write_record(&Self::render(event));
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_code_on_failure() {
        let ev = Event::now(EventKind::JobFailed)
            .with_slot(1)
            .with_host("fast.example")
            .with_line("b.raw")
            .with_code(1);
        let rec = TraceWriter::render(&ev);
        assert_eq!(rec, "[failed] slot=1 host=fast.example code=1 line='b.raw'");
    }

    #[test]
    fn render_drain_is_fixed_text() {
        let rec = TraceWriter::render(&Event::now(EventKind::DrainRequested));
        assert_eq!(rec, "[drain] no further admissions");
    }
}
