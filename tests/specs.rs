// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level behavior specs: laws that cross crate boundaries.

use axon_core::outputs;
use axon_core::template::{self, TemplateData};
use axon_operator::controller::outputs::ingest_tail;

/// A block rendered by the capture side and re-read from a log tail by the
/// controller side yields identical lines, order and duplicates intact.
#[test]
fn capture_to_controller_round_trip() {
    let lines: Vec<String> = [
        "branch: axon/fix-login",
        "pr: https://github.com/acme/widgets/pull/7",
        "pr: https://github.com/acme/widgets/pull/7",
        "commit: 4bf12a9cafe0",
        "base-branch: main",
        "cost-usd: 0.05",
        "input-tokens: 1200",
        "output-tokens: 340",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let block = outputs::render_block(&lines).unwrap();
    // The block sits at the end of an arbitrary agent log.
    let tail = format!("agent chatter\nmore output\n{block}");

    let outcome = ingest_tail(&tail).unwrap();
    assert_eq!(outcome.lines, lines);

    // results is last-write-wins over unique keys
    assert_eq!(outcome.results.get("cost-usd").map(String::as_str), Some("0.05"));
    assert_eq!(outcome.results.get("pr").map(String::as_str), Some("https://github.com/acme/widgets/pull/7"));
}

/// The capture usage parser feeds lines whose shape the controller-side
/// results map understands.
#[test]
fn usage_lines_flow_into_results() {
    let log = concat!(
        r#"{"type":"result","total_cost_usd":0.01,"usage":{"input_tokens":10,"output_tokens":5}}"#,
        "\n",
        r#"{"type":"result","total_cost_usd":0.05,"usage":{"input_tokens":100,"output_tokens":50}}"#,
        "\n",
    );
    let lines = axon_capture::usage::parse("claude-code", log);
    let block = outputs::render_block(&lines).unwrap();
    let outcome = ingest_tail(&block).unwrap();
    assert_eq!(outcome.results.get("cost-usd").map(String::as_str), Some("0.05"));
    assert_eq!(outcome.results.get("input-tokens").map(String::as_str), Some("100"));
}

/// Scenario: Task B depends on A; once A succeeds with outputs, B's prompt
/// renders against them.
#[test]
fn dependency_outputs_render_into_prompt() {
    let data = TemplateData::new().with_dep("A", vec!["branch: main".to_string()]);
    let rendered =
        template::render(r#"use {{ index .Deps "A" "Outputs" 0 }}"#, &data).unwrap();
    assert_eq!(rendered, "use branch: main");
}

/// A template that points at a dependency with no outputs is a strict
/// error, which callers resolve by keeping the raw prompt.
#[test]
fn missing_outputs_fall_back_to_raw() {
    let data = TemplateData::new().with_dep("A", Vec::new());
    let raw = r#"use {{ index .Deps "A" "Outputs" 0 }}"#;
    assert!(template::render(raw, &data).is_err());
}
