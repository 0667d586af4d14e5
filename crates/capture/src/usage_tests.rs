// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// =============================================================================
// claude-code
// =============================================================================

#[test]
fn claude_takes_last_result_object() {
    let log = concat!(
        r#"{"type":"assistant","message":"working"}"#, "\n",
        r#"{"type":"result","total_cost_usd":0.01,"usage":{"input_tokens":10,"output_tokens":5}}"#, "\n",
        r#"{"type":"result","total_cost_usd":0.05,"usage":{"input_tokens":100,"output_tokens":50}}"#, "\n",
    );
    assert_eq!(
        parse("claude-code", log),
        vec!["cost-usd: 0.05", "input-tokens: 100", "output-tokens: 50"]
    );
}

#[test]
fn claude_without_result_emits_nothing() {
    let log = r#"{"type":"assistant","message":"hi"}"#;
    assert!(parse("claude-code", log).is_empty());
}

#[test]
fn claude_result_without_usage_still_reports_cost() {
    let log = r#"{"type":"result","total_cost_usd":1.25}"#;
    assert_eq!(parse("claude-code", log), vec!["cost-usd: 1.25"]);
}

// =============================================================================
// codex
// =============================================================================

#[test]
fn codex_sums_all_completed_turns() {
    let log = concat!(
        r#"{"type":"turn.completed","usage":{"input_tokens":7,"output_tokens":3}}"#, "\n",
        r#"{"type":"turn.started"}"#, "\n",
        r#"{"type":"turn.completed","usage":{"input_tokens":13,"output_tokens":4}}"#, "\n",
    );
    assert_eq!(parse("codex", log), vec!["input-tokens: 20", "output-tokens: 7"]);
}

#[test]
fn codex_all_zero_emits_nothing() {
    let log = r#"{"type":"turn.completed","usage":{"input_tokens":0,"output_tokens":0}}"#;
    assert!(parse("codex", log).is_empty());
    assert!(parse("codex", "").is_empty());
}

// =============================================================================
// gemini
// =============================================================================

#[test]
fn gemini_reads_stats_from_last_result() {
    let log = concat!(
        r#"{"type":"result","stats":{"inputTokens":11,"outputTokens":2}}"#, "\n",
        r#"{"type":"result","stats":{"inputTokens":42,"outputTokens":9}}"#, "\n",
    );
    assert_eq!(parse("gemini", log), vec!["input-tokens: 42", "output-tokens: 9"]);
}

// =============================================================================
// opencode
// =============================================================================

#[test]
fn opencode_sums_step_finish_parts() {
    let log = concat!(
        r#"{"type":"step_finish","part":{"tokens":{"input":5,"output":1}}}"#, "\n",
        r#"{"type":"text","part":{"text":"..."}}"#, "\n",
        r#"{"type":"step_finish","part":{"tokens":{"input":6,"output":2}}}"#, "\n",
    );
    assert_eq!(parse("opencode", log), vec!["input-tokens: 11", "output-tokens: 3"]);
}

#[test]
fn opencode_without_steps_emits_nothing() {
    assert!(parse("opencode", r#"{"type":"text"}"#).is_empty());
}

// =============================================================================
// dispatch and robustness
// =============================================================================

#[test]
fn unknown_or_empty_agent_emits_nothing() {
    let log = r#"{"type":"result","total_cost_usd":0.5}"#;
    assert!(parse("", log).is_empty());
    assert!(parse("cursor", log).is_empty());
}

#[test]
fn malformed_lines_are_skipped() {
    let log = concat!(
        "not json at all\n",
        r#"{"type":"result","total_cost_usd":0.02,"usage":{"input_tokens":1,"output_tokens":1}}"#, "\n",
        "{truncated\n",
    );
    assert_eq!(
        parse("claude-code", log),
        vec!["cost-usd: 0.02", "input-tokens: 1", "output-tokens: 1"]
    );
}

#[test]
fn decimal_cost_keeps_its_form() {
    let log = r#"{"type":"result","total_cost_usd":0.105}"#;
    assert_eq!(parse("claude-code", log), vec!["cost-usd: 0.105"]);
}
