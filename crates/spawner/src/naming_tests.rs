// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn same_key_same_name() {
    assert_eq!(task_name("triage", "issue/42"), task_name("triage", "issue/42"));
}

#[test]
fn different_keys_differ() {
    assert_ne!(task_name("triage", "issue/42"), task_name("triage", "issue/43"));
}

#[test]
fn name_is_prefixed_and_dns_safe() {
    let name = task_name("nightly-build", "cron/2026-03-01T12:34:00Z");
    assert!(name.starts_with("nightly-build-"));
    assert!(name.len() <= 63);
    assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
}

#[test]
fn long_spawner_names_are_truncated() {
    let long = "s".repeat(80);
    let name = task_name(&long, "issue/1");
    assert!(name.len() <= 63, "got {} chars", name.len());
}
