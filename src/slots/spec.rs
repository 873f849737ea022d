//! # Slot specification parser.
//!
//! Turns a textual slot description into an ordered list of [`SlotEntry`]
//! descriptors. The grammar, informally:
//!
//! ```text
//! spec  := entry (',' entry)*
//! entry := [count '*'] [host] [':' workdir]
//! ```
//!
//! - `count`: positive integer, default 1.
//! - A bare integer up to end-of-entry means that many local slots
//!   (`"3"` ≡ `"3*"`). A bare integer followed by `:` is a *hostname* of
//!   digits — the shorthand applies only at end-of-entry.
//! - `host`: `[A-Za-z0-9.@-]+`; absent, `localhost`, or `-` means local.
//! - `workdir`: everything after the first `:`; applies to every slot the
//!   entry expands to.
//!
//! Entry order is preserved into slot order; that ordering is the
//! dispatch-priority contract (earlier entries are saturated first).
//!
//! ## Examples
//! ```
//! use jobfan::parse_spec;
//!
//! let entries = parse_spec("2,4*crunch.example:~/work,slow.example").unwrap();
//! assert_eq!(entries.len(), 3);
//! assert_eq!(entries[0].count, 2);
//! assert!(entries[0].host.is_none());
//! assert_eq!(entries[1].host.as_deref(), Some("crunch.example"));
//! assert_eq!(entries[1].workdir.as_deref(), Some("~/work"));
//! ```

use crate::error::SpecError;

/// One parsed entry of a slot specification, before expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotEntry {
    /// How many identical slots this entry expands to.
    pub count: usize,
    /// Target host; `None` means local execution.
    pub host: Option<String>,
    /// Working directory shared by every slot of this entry.
    pub workdir: Option<String>,
}

impl SlotEntry {
    /// A single local slot with no working directory.
    pub fn local() -> Self {
        Self {
            count: 1,
            host: None,
            workdir: None,
        }
    }
}

/// Parses a slot specification string into ordered entries.
///
/// Surrounding ASCII whitespace is trimmed per entry; everything else is
/// significant. All errors are fatal before any dispatch.
pub fn parse_spec(spec: &str) -> Result<Vec<SlotEntry>, SpecError> {
    if spec.trim().is_empty() {
        return Err(SpecError::Empty);
    }

    spec.split(',')
        .enumerate()
        .map(|(position, raw)| parse_entry(raw.trim(), position))
        .collect()
}

/// The default slot list when no specification is given: one local slot
/// per available processing unit, minimum 1.
pub fn default_entries() -> Vec<SlotEntry> {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    vec![SlotEntry {
        count: cpus.max(1),
        host: None,
        workdir: None,
    }]
}

fn parse_entry(entry: &str, position: usize) -> Result<SlotEntry, SpecError> {
    if entry.is_empty() {
        return Err(SpecError::EmptyEntry { position });
    }

    let digits: String = entry.chars().take_while(|c| c.is_ascii_digit()).collect();
    let after_digits = &entry[digits.len()..];

    // Bare integer: `count` local slots. Only at end-of-entry; digits
    // followed by anything except '*' are an ordinary hostname.
    if !digits.is_empty() && after_digits.is_empty() {
        return Ok(SlotEntry {
            count: parse_count(&digits, entry)?,
            host: None,
            workdir: None,
        });
    }

    let (count, rest) = if !digits.is_empty() && after_digits.starts_with('*') {
        (parse_count(&digits, entry)?, &after_digits[1..])
    } else {
        (1, entry)
    };

    let (host_part, workdir) = match rest.split_once(':') {
        Some((_, "")) => return Err(SpecError::EmptyWorkdir { entry: entry.into() }),
        Some((h, dir)) => (h, Some(dir.to_string())),
        None => (rest, None),
    };

    if let Some(ch) = host_part
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '.' | '@'))
    {
        return Err(SpecError::InvalidHost { entry: entry.into(), ch });
    }

    let host = match host_part {
        "" | "-" | "localhost" => None,
        h => Some(h.to_string()),
    };

    Ok(SlotEntry { count, host, workdir })
}

fn parse_count(digits: &str, entry: &str) -> Result<usize, SpecError> {
    match digits.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SpecError::ZeroCount { entry: entry.into() }),
    }
}
