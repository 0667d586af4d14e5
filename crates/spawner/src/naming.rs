// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic names for spawned Tasks.
//!
//! The same (spawner, item key) pair must always produce the same Task name
//! so that duplicate discoveries — worker restarts, overlapping ticks —
//! collapse onto a single create that the API server deduplicates.

use sha2::{Digest, Sha256};

/// Hex digits of the key hash appended to the spawner name.
const HASH_LEN: usize = 10;

/// Longest spawner-name prefix that still leaves room for the hash suffix
/// within the 63-character DNS label limit.
const MAX_PREFIX: usize = 63 - HASH_LEN - 1;

/// Derive the Task name for a discovered item key such as `issue/42`,
/// `cron/2026-03-01T12:34:00Z`, or `jira/PROJ-7`.
pub fn task_name(spawner: &str, key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut hash = String::with_capacity(HASH_LEN);
    for byte in digest.iter() {
        hash.push_str(&format!("{byte:02x}"));
        if hash.len() >= HASH_LEN {
            break;
        }
    }
    hash.truncate(HASH_LEN);

    let prefix: String = spawner.chars().take(MAX_PREFIX).collect();
    format!("{prefix}-{hash}")
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
