// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! axon-capture: in-pod output capture.
//!
//! Runs once after the agent finishes, queries the checked-out repository
//! and the agent's NDJSON session log, and prints a delimited
//! `key: value` block to stdout for the controller to re-ingest from the
//! pod-log tail. Every external command runs under a timeout and degrades
//! to an omitted line on failure.

pub mod cmd;
pub mod git;
pub mod pr;
pub mod usage;

use axon_core::labels::{AGENT_TYPE_ENV, BASE_BRANCH_ENV};
use axon_core::outputs;

/// Gather every output line in emission order: branch, pr, commit,
/// base-branch, then usage.
pub async fn collect_lines() -> Vec<String> {
    let mut lines = Vec::new();

    if git::is_work_tree().await {
        let branch = git::current_branch().await;
        if let Some(ref branch) = branch {
            lines.push(outputs::format_line("branch", branch));
            for url in pr::pr_urls(branch).await {
                lines.push(outputs::format_line("pr", &url));
            }
        }
        if let Some(commit) = git::head_commit().await {
            lines.push(outputs::format_line("commit", &commit));
        }
        let base_override = std::env::var(BASE_BRANCH_ENV).ok();
        if let Some(base) = git::base_branch(base_override.as_deref()).await {
            lines.push(outputs::format_line("base-branch", &base));
        }
    }

    let agent = std::env::var(AGENT_TYPE_ENV).unwrap_or_default();
    let log_path = std::env::var("AXON_AGENT_LOG")
        .unwrap_or_else(|_| axon_core::labels::AGENT_LOG_PATH.to_string());
    match tokio::fs::read_to_string(&log_path).await {
        Ok(content) => lines.extend(usage::parse(&agent, &content)),
        Err(e) => tracing::debug!(path = %log_path, error = %e, "no agent log to parse"),
    }

    lines
}
