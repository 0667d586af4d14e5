// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    main = { "refs/remotes/origin/main", "main" },
    master = { "refs/remotes/origin/master", "master" },
    nested = { "refs/remotes/origin/release/2026-01", "2026-01" },
    bare = { "main", "main" },
)]
fn symbolic_ref_keeps_last_component(sym: &str, expected: &str) {
    assert_eq!(base_branch_from_symbolic_ref(sym), expected);
}

#[tokio::test]
async fn non_empty_override_wins_without_running_git() {
    assert_eq!(base_branch(Some("develop")).await.as_deref(), Some("develop"));
}
