//! # Two-stage cancellation.
//!
//! An operator interrupt escalates in two stages:
//!
//! 1. **Drain** — stop admitting lines and launching jobs; whatever is
//!    running finishes normally.
//! 2. **Force** — deliver the interrupt directly to every running child.
//!
//! The stages are exposed as two [`CancellationToken`]s observed
//! cooperatively by the dispatcher: `drain` at its admission check point,
//! `force` while it blocks on the reaper. [`install`] wires the tokens to
//! OS signals (SIGINT/SIGTERM on Unix, Ctrl-C elsewhere); tests cancel
//! them programmatically instead.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The pair of escalation stages for one run.
#[derive(Clone, Debug, Default)]
pub struct Escalation {
    /// Stage one: graceful drain.
    pub drain: CancellationToken,
    /// Stage two: forced stop of running jobs.
    pub force: CancellationToken,
}

impl Escalation {
    /// Fresh, untriggered escalation tokens.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Spawns the signal listener arming both stages in order.
///
/// The first termination signal cancels `drain` and re-arms for stage
/// two; the second cancels `force`. The task ends after stage two.
pub fn install(escalation: &Escalation) -> JoinHandle<()> {
    let esc = escalation.clone();
    tokio::spawn(async move {
        if wait_for_interrupt().await.is_err() {
            return;
        }
        eprintln!("jobfan: interrupt: draining (running jobs finish; interrupt again to stop them)");
        esc.drain.cancel();

        if wait_for_interrupt().await.is_err() {
            return;
        }
        eprintln!("jobfan: interrupt: stopping running jobs");
        esc.force.cancel();
    })
}

/// Completes when one termination signal arrives.
#[cfg(unix)]
async fn wait_for_interrupt() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}

/// Completes when one termination signal arrives.
#[cfg(not(unix))]
async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tokens_are_untriggered() {
        let esc = Escalation::new();
        assert!(!esc.drain.is_cancelled());
        assert!(!esc.force.is_cancelled());
    }

    #[test]
    fn stages_are_independent_tokens() {
        let esc = Escalation::new();
        esc.drain.cancel();
        assert!(esc.drain.is_cancelled());
        assert!(!esc.force.is_cancelled());
    }
}
