//! Run-wide mutable state and the final report.

/// How far cancellation has escalated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterruptStage {
    /// No interruption observed.
    #[default]
    None,
    /// Stage one: no further admissions; running jobs finish.
    Draining,
    /// Stage two: running jobs were signalled directly.
    Forcing,
}

/// Process-wide state for the duration of one run.
///
/// Initialized once at startup, mutated only by the dispatcher at its
/// check points, discarded with the run.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    /// Cancellation escalation observed so far.
    pub interrupt: InterruptStage,
    /// At least one job exited nonzero.
    pub error_encountered: bool,
    /// Jobs launched (including failed spawns).
    pub launched: u64,
    /// Jobs reaped with a nonzero status.
    pub failed: u64,
}

impl RunState {
    /// True while new lines may still be admitted.
    pub fn admission_open(&self, continue_on_error: bool) -> bool {
        self.interrupt == InterruptStage::None
            && (!self.error_encountered || continue_on_error)
    }
}

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Jobs launched over the run.
    pub launched: u64,
    /// Jobs that exited nonzero (launch failures included).
    pub failed: u64,
    /// Slots quarantined by the reachability probe.
    pub faulted_slots: usize,
    /// Where cancellation ended up.
    pub interrupt: InterruptStage,
}

impl RunReport {
    /// True when every job exited zero.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}
