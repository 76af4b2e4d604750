// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log line capture: filtering and prefix stripping
//!
//! The backend's sync-print hook and ambient log channel both land in the
//! task's log sink. Periodic stats blocks and internal bookkeeping traces
//! are dropped; the `date time LEVEL :` prefix is stripped so samples
//! carry message content only.

use regex::Regex;
use std::sync::OnceLock;

/// Max log lines attached to one progress sample.
pub(crate) const MAX_LOG_TAIL: usize = 50;

// The pattern is a compile-time constant; construction cannot fail
#[allow(clippy::unwrap_used)]
fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `2026/01/15 10:30:00 INFO  : message` and level-less variants
        Regex::new(
            r"^\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}\s+(?:(?:DEBUG|INFO|NOTICE|WARNING|ERROR)\s*)?:?\s*",
        )
        .unwrap()
    })
}

/// Stats-block lines the backend prints on its own timer.
fn is_periodic_stats(message: &str) -> bool {
    let trimmed = message.trim_start();
    trimmed.starts_with("Transferred:")
        || trimmed.starts_with("Checks:")
        || trimmed.starts_with("Deleted:")
        || trimmed.starts_with("Renamed:")
        || trimmed.starts_with("Elapsed time:")
        || trimmed.starts_with("Transferring:")
        || trimmed.starts_with("* ")
}

/// Internal diagnostics that would only confuse the frontend.
fn is_internal_trace(message: &str) -> bool {
    let trimmed = message.trim_start();
    trimmed.starts_with("event-bus:") || trimmed.starts_with("frontend:")
}

/// Process one captured line into displayable message content.
///
/// Returns `None` for lines that should be dropped.
pub(crate) fn process_line(line: &str) -> Option<String> {
    let message = prefix_re().replace(line, "").trim_end().to_string();
    if message.is_empty() || is_periodic_stats(&message) || is_internal_trace(&message) {
        return None;
    }
    Some(message)
}

/// Filter and strip a drained batch, keeping at most the last
/// [`MAX_LOG_TAIL`] lines.
pub(crate) fn process_batch(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = lines.iter().filter_map(|l| process_line(l)).collect();
    if out.len() > MAX_LOG_TAIL {
        out.drain(..out.len() - MAX_LOG_TAIL);
    }
    out
}

#[cfg(test)]
#[path = "logcap_tests.rs"]
mod tests;
