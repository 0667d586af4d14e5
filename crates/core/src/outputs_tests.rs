// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn render_is_none_for_no_lines() {
    assert_eq!(render_block(&[]), None);
}

#[test]
fn render_wraps_lines_in_markers() {
    let block = render_block(&lines(&["branch: main", "commit: abc"])).unwrap();
    assert_eq!(
        block,
        "---AXON_OUTPUTS_START---\nbranch: main\ncommit: abc\n---AXON_OUTPUTS_END---\n"
    );
}

#[test]
fn extract_round_trips_order_and_duplicates() {
    let payload = lines(&["pr: https://x/1", "pr: https://x/1", "branch: main"]);
    let block = render_block(&payload).unwrap();
    let tail = format!("agent chatter\nmore chatter\n{block}");
    assert_eq!(extract_block(&tail).unwrap(), payload);
}

#[test]
fn extract_requires_both_markers() {
    assert_eq!(extract_block("no markers at all"), None);
    assert_eq!(extract_block("---AXON_OUTPUTS_START---\nbranch: main\n"), None);
    assert_eq!(extract_block("branch: main\n---AXON_OUTPUTS_END---\n"), None);
}

#[test]
fn extract_ignores_indented_marker_lookalikes() {
    let tail = "  ---AXON_OUTPUTS_START---\nbranch: main\n---AXON_OUTPUTS_END---\n";
    // Leading whitespace means the start line is not a marker.
    assert_eq!(extract_block(tail), None);
}

#[test]
fn extract_skips_blank_payload_lines() {
    let tail = "---AXON_OUTPUTS_START---\n\nbranch: main\n\n---AXON_OUTPUTS_END---\n";
    assert_eq!(extract_block(tail).unwrap(), lines(&["branch: main"]));
}

#[test]
fn parse_line_splits_on_first_colon() {
    assert_eq!(parse_line("pr: https://github.com/x/1"), Some(("pr", "https://github.com/x/1")));
    assert_eq!(parse_line("no separator"), None);
}

#[test]
fn results_map_is_last_write_wins() {
    let map = results_map(&lines(&["cost-usd: 0.01", "cost-usd: 0.05", "branch: main"]));
    assert_eq!(map.get("cost-usd").map(String::as_str), Some("0.05"));
    assert_eq!(map.get("branch").map(String::as_str), Some("main"));
    assert_eq!(map.len(), 2);
}

#[test]
fn format_line_uses_single_space() {
    assert_eq!(format_line("input-tokens", "123"), "input-tokens: 123");
}
