//! # Shell escaping for remote argument vectors.
//!
//! The secure-shell launcher joins its arguments with spaces and hands the
//! result to the remote login shell, which re-parses it. Every token sent
//! to a remote slot therefore goes through [`shell_escape`], which keeps a
//! small allowlist untouched and backslash-escapes everything else.
//!
//! ## Rules
//! - Allowlist: ASCII alphanumerics, `_`, `-`, `/`, `.`.
//! - Every other character is prefixed with a backslash.
//! - The empty string becomes `''` so it survives as an argument at all.
//!
//! Input lines cannot contain a newline (the reader strips terminators),
//! which matters: a backslash-newline would be a line continuation, not an
//! escaped newline.

/// Escapes `s` for re-parsing by a remote POSIX shell.
///
/// The escaped form, evaluated by a shell, reproduces `s` byte-for-byte as
/// a single word.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '/' | '.') {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}
