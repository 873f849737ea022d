//! The dispatch engine: run-wide state and the admission/reap control loop.

mod core;
mod state;

pub use core::Dispatcher;
pub use state::{InterruptStage, RunReport, RunState};
