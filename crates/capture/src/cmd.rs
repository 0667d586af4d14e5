// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with bounded runtime.

use std::time::Duration;
use tokio::process::Command;

/// Timeout applied to every subcommand the capture program runs.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a command and return its trimmed stdout.
///
/// Any failure mode — spawn error, non-zero exit, timeout — yields `None`
/// so callers omit the corresponding output line and keep going.
pub async fn run(program: &str, args: &[&str]) -> Option<String> {
    let fut = Command::new(program).args(args).output();
    let output = match tokio::time::timeout(COMMAND_TIMEOUT, fut).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::debug!(%program, error = %e, "command failed to spawn");
            return None;
        }
        Err(_) => {
            tracing::warn!(%program, ?args, "command timed out");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(%program, ?args, status = ?output.status.code(), "command exited nonzero");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}
