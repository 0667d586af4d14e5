// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pod-log outputs contract.
//!
//! The capture binary prints a delimited block of `key: value` lines to
//! stdout; the reconciler re-reads it from the pod-log tail. Both sides go
//! through this module, so the marker literals and line grammar exist in
//! exactly one place.

use std::collections::BTreeMap;

/// Opening delimiter of the outputs block in pod stdout.
///
/// Matched byte-for-byte with no whitespace variation.
pub const OUTPUTS_START_MARKER: &str = "---AXON_OUTPUTS_START---";

/// Closing delimiter of the outputs block in pod stdout.
pub const OUTPUTS_END_MARKER: &str = "---AXON_OUTPUTS_END---";

/// Render output lines as a marker block, each line `\n`-terminated.
///
/// Returns `None` when `lines` is empty: a run with nothing to report emits
/// no markers at all.
pub fn render_block(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let mut block = String::new();
    block.push_str(OUTPUTS_START_MARKER);
    block.push('\n');
    for line in lines {
        block.push_str(line);
        block.push('\n');
    }
    block.push_str(OUTPUTS_END_MARKER);
    block.push('\n');
    Some(block)
}

/// Extract the block payload from a log tail.
///
/// Returns the non-empty lines strictly between the first start marker and
/// the next end marker, or `None` when either marker is absent. Order and
/// duplicates are preserved.
pub fn extract_block(tail: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = tail.lines().collect();
    let start = lines.iter().position(|l| *l == OUTPUTS_START_MARKER)?;
    let end = lines[start + 1..].iter().position(|l| *l == OUTPUTS_END_MARKER)? + start + 1;
    Some(
        lines[start + 1..end]
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.to_string())
            .collect(),
    )
}

/// Split one output line at its first colon into `(key, value)`.
///
/// Lines without a colon are not entries and yield `None`.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Fold lines into a last-write-wins map of unique keys.
pub fn results_map(lines: &[String]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in lines {
        if let Some((key, value)) = parse_line(line) {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

/// Format a single `key: value` entry (single space after the colon).
pub fn format_line(key: &str, value: &str) -> String {
    format!("{key}: {value}")
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
