//! # Child spawning.
//!
//! One spawn primitive for local and remote jobs alike: by the time an
//! argument vector reaches [`spawn_job`], the remote launcher prefix is
//! already part of it, so the dispatcher treats every slot identically.
//!
//! ## Rules
//! - The child's stdin is a null source; concurrent children must never
//!   contend for (or accidentally drain) the dispatcher's input stream.
//! - stdout/stderr are inherited; the launched commands own them.
//! - `workdir` applies to the child only, never to the dispatcher.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Spawns one job. `argv[0]` is the program; the rest are its arguments.
///
/// A spawn error (executable not found, permission denied) is fatal only
/// to this job; the caller records it as a failed job with a
/// distinguishing status.
pub fn spawn_job(argv: &[String], workdir: Option<&Path>) -> std::io::Result<Child> {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]).stdin(Stdio::null());
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    cmd.spawn()
}

/// Delivers SIGINT directly to a child process.
///
/// Used by the forced stage of cancellation; the reaper observes the
/// termination as usual.
#[cfg(unix)]
pub fn interrupt(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGINT);
    }
}

/// Delivers an interrupt to a child process (no-op off Unix).
#[cfg(not(unix))]
pub fn interrupt(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn child_stdin_is_empty() {
        // `wc -c` on a null stdin reads zero bytes and exits 0.
        let argv = vec!["sh".to_string(), "-c".to_string(), "wc -c >/dev/null".to_string()];
        let mut child = spawn_job(&argv, None).expect("spawn");
        let status = child.wait().await.expect("wait");
        assert!(status.success());
    }

    #[tokio::test]
    async fn workdir_applies_to_child() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join("here");
        let argv = vec![
            "sh".to_string(),
            "-c".to_string(),
            "pwd > here".to_string(),
        ];
        let mut child = spawn_job(&argv, Some(dir.path())).expect("spawn");
        assert!(child.wait().await.expect("wait").success());
        let seen = std::fs::read_to_string(&marker).expect("marker");
        let canon_seen = std::fs::canonicalize(seen.trim()).expect("canon");
        let canon_dir = std::fs::canonicalize(dir.path()).expect("canon");
        assert_eq!(canon_seen, canon_dir);
    }

    #[tokio::test]
    async fn spawn_failure_is_an_error_not_a_panic() {
        let argv = vec!["/nonexistent/definitely-not-a-program".to_string()];
        assert!(spawn_job(&argv, None).is_err());
    }
}
