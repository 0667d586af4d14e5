// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git state probes over the checked-out workspace.

use crate::cmd;

/// Whether the working directory is inside a git work tree.
///
/// When it is not, every git-derived output line is suppressed.
pub async fn is_work_tree() -> bool {
    matches!(
        cmd::run("git", &["rev-parse", "--is-inside-work-tree"]).await.as_deref(),
        Some("true")
    )
}

/// Current branch name; `None` when HEAD is detached.
pub async fn current_branch() -> Option<String> {
    let name = cmd::run("git", &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
    // rev-parse prints the literal "HEAD" for a detached head
    if name == "HEAD" {
        None
    } else {
        Some(name)
    }
}

/// Full SHA of HEAD.
pub async fn head_commit() -> Option<String> {
    cmd::run("git", &["rev-parse", "HEAD"]).await
}

/// The base branch: the override when non-empty, otherwise the last path
/// component of `refs/remotes/origin/HEAD`.
pub async fn base_branch(env_override: Option<&str>) -> Option<String> {
    if let Some(base) = env_override {
        if !base.is_empty() {
            return Some(base.to_string());
        }
    }
    let sym = cmd::run("git", &["symbolic-ref", "refs/remotes/origin/HEAD"]).await?;
    Some(base_branch_from_symbolic_ref(&sym))
}

/// `refs/remotes/origin/main` → `main`.
pub fn base_branch_from_symbolic_ref(sym: &str) -> String {
    sym.rsplit('/').next().unwrap_or(sym).to_string()
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
