// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull-request enumeration through the GitHub CLI.
//!
//! `gh pr list --head <branch> --json url` prints a JSON array of
//! `{"url": ...}` objects. A missing or unauthenticated `gh` simply means
//! no `pr:` lines.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PrEntry {
    url: String,
}

/// URLs of pull requests whose head is `branch`, in listing order.
pub async fn pr_urls(branch: &str) -> Vec<String> {
    let Some(stdout) = crate::cmd::run("gh", &["pr", "list", "--head", branch, "--json", "url"]).await
    else {
        return Vec::new();
    };
    parse_pr_list(&stdout)
}

/// Parse the `gh pr list --json url` payload.
pub fn parse_pr_list(json: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<PrEntry>>(json) {
        Ok(entries) => entries.into_iter().map(|e| e.url).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "unparseable pr list output");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "pr_tests.rs"]
mod tests;
