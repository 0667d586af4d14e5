// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent NDJSON usage parsers.
//!
//! Each agent writes a session log in its own NDJSON dialect; these parsers
//! extract token counts and cost and format them as output lines. Numeric
//! values lifted directly from the log keep their JSON representation;
//! summed values are formatted as plain integers.

use axon_core::outputs::format_line;
use serde_json::Value;

/// Parse `content` according to `agent` (`AXON_AGENT_TYPE`).
///
/// Unknown or empty agent kinds produce no lines. Lines come out in the
/// fixed order `cost-usd`, `input-tokens`, `output-tokens`.
pub fn parse(agent: &str, content: &str) -> Vec<String> {
    match agent {
        "claude-code" => parse_claude(content),
        "codex" => parse_codex(content),
        "gemini" => parse_gemini(content),
        "opencode" => parse_opencode(content),
        _ => Vec::new(),
    }
}

/// NDJSON objects in document order, skipping unparseable lines.
fn objects(content: &str) -> impl Iterator<Item = Value> + '_ {
    content.lines().filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
}

/// Objects whose `type` field equals `kind`.
fn of_type<'a>(content: &'a str, kind: &'a str) -> impl Iterator<Item = Value> + 'a {
    objects(content).filter(move |v| v.get("type").and_then(Value::as_str) == Some(kind))
}

/// claude-code: the last `result` object carries the session totals.
fn parse_claude(content: &str) -> Vec<String> {
    let Some(result) = of_type(content, "result").last() else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    if let Some(cost) = result.get("total_cost_usd").filter(|v| v.is_number()) {
        lines.push(format_line("cost-usd", &cost.to_string()));
    }
    push_tokens(&mut lines, result.get("usage"), "input_tokens", "output_tokens");
    lines
}

/// codex: token counts accumulate across `turn.completed` events. A session
/// where both sums are zero reports nothing.
fn parse_codex(content: &str) -> Vec<String> {
    let (mut input, mut output) = (0u64, 0u64);
    for event in of_type(content, "turn.completed") {
        let usage = event.get("usage");
        input += u64_at(usage, "input_tokens");
        output += u64_at(usage, "output_tokens");
    }
    if input == 0 && output == 0 {
        return Vec::new();
    }
    vec![
        format_line("input-tokens", &input.to_string()),
        format_line("output-tokens", &output.to_string()),
    ]
}

/// gemini: the last `result` object carries `stats` with camelCase counters.
fn parse_gemini(content: &str) -> Vec<String> {
    let Some(result) = of_type(content, "result").last() else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    push_tokens(&mut lines, result.get("stats"), "inputTokens", "outputTokens");
    lines
}

/// opencode: token counts accumulate across `step_finish` parts.
fn parse_opencode(content: &str) -> Vec<String> {
    let mut seen = false;
    let (mut input, mut output) = (0u64, 0u64);
    for event in of_type(content, "step_finish") {
        seen = true;
        let tokens = event.get("part").and_then(|p| p.get("tokens"));
        input += u64_at(tokens, "input");
        output += u64_at(tokens, "output");
    }
    if !seen {
        return Vec::new();
    }
    vec![
        format_line("input-tokens", &input.to_string()),
        format_line("output-tokens", &output.to_string()),
    ]
}

/// Append `input-tokens`/`output-tokens` lines from a container object,
/// keeping the source JSON number representation.
fn push_tokens(lines: &mut Vec<String>, container: Option<&Value>, input_key: &str, output_key: &str) {
    let Some(container) = container else { return };
    if let Some(v) = container.get(input_key).filter(|v| v.is_number()) {
        lines.push(format_line("input-tokens", &v.to_string()));
    }
    if let Some(v) = container.get(output_key).filter(|v| v.is_number()) {
        lines.push(format_line("output-tokens", &v.to_string()));
    }
}

fn u64_at(container: Option<&Value>, key: &str) -> u64 {
    container.and_then(|c| c.get(key)).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
