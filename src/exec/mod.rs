//! Process launching: argument-vector construction, remote shell escaping,
//! and child spawning.

mod argv;
mod escape;
mod spawn;

pub use argv::{base_argv, job_argv};
pub use escape::shell_escape;
pub use spawn::{interrupt, spawn_job};
