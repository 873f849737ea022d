//! # Argument-vector construction.
//!
//! The dispatcher never special-cases remote vs. local beyond what happens
//! here: a slot's launch prefix ([`base_argv`]) is fixed at table build,
//! and [`job_argv`] appends one input line per dispatch.
//!
//! ## Rules
//! - Local: the command tokens as given; the line is appended raw (no
//!   re-splitting, whatever whitespace it contains).
//! - Remote: `<ssh> <host>`, then `cd <dir> ;` when a working directory is
//!   declared, then every command token shell-escaped; the line is escaped
//!   too when appended. The `cd` and `;` tokens stay unescaped so the
//!   remote shell interprets them.

use crate::slots::{Slot, SlotKind};

use super::escape::shell_escape;

/// Builds a slot's fixed launch prefix.
///
/// `workdir` is only embedded for remote slots; local slots change
/// directory in the child instead (see [`spawn_job`](super::spawn_job)).
pub fn base_argv(
    kind: &SlotKind,
    workdir: Option<&str>,
    command: &[String],
    ssh_program: &str,
) -> Vec<String> {
    match kind {
        SlotKind::Local => command.to_vec(),
        SlotKind::Remote { host } => {
            let mut argv = vec![ssh_program.to_string(), host.to_string()];
            if let Some(dir) = workdir {
                // The workdir is embedded verbatim: it is a remote-side
                // path, and expansion (`~`, variables) belongs to the
                // remote shell.
                argv.push("cd".to_string());
                argv.push(dir.to_string());
                argv.push(";".to_string());
            }
            argv.extend(command.iter().map(|tok| shell_escape(tok)));
            argv
        }
    }
}

/// Builds the final argument vector for one job on one slot.
pub fn job_argv(slot: &Slot, line: &str) -> Vec<String> {
    let mut argv = slot.base_argv.clone();
    argv.push(match slot.kind {
        SlotKind::Local => line.to_string(),
        SlotKind::Remote { .. } => shell_escape(line),
    });
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::SlotState;

    fn slot(kind: SlotKind, workdir: Option<&str>, command: &[&str]) -> Slot {
        let command: Vec<String> = command.iter().map(|s| s.to_string()).collect();
        Slot {
            index: 0,
            base_argv: base_argv(&kind, workdir, &command, "ssh"),
            kind,
            workdir: workdir.map(Into::into),
            state: SlotState::Idle,
        }
    }

    #[test]
    fn local_line_is_appended_raw() {
        let s = slot(SlotKind::Local, None, &["bzip2", "-9"]);
        assert_eq!(
            job_argv(&s, "name with spaces.tar"),
            vec!["bzip2", "-9", "name with spaces.tar"]
        );
    }

    #[test]
    fn remote_tokens_and_line_are_escaped() {
        let s = slot(
            SlotKind::Remote {
                host: "crunch.example".into(),
            },
            None,
            &["bzip2", "-9"],
        );
        assert_eq!(
            job_argv(&s, "a b"),
            vec!["ssh", "crunch.example", "bzip2", "-9", "a\\ b"]
        );
    }

    #[test]
    fn remote_workdir_becomes_cd_prefix() {
        let s = slot(
            SlotKind::Remote {
                host: "crunch.example".into(),
            },
            Some("~/scratch"),
            &["wc", "-c"],
        );
        assert_eq!(
            s.base_argv,
            vec!["ssh", "crunch.example", "cd", "~/scratch", ";", "wc", "-c"]
        );
    }

    #[test]
    fn local_workdir_stays_out_of_argv() {
        let s = slot(SlotKind::Local, Some("/tmp/w"), &["pwd"]);
        assert_eq!(s.base_argv, vec!["pwd"]);
    }
}
