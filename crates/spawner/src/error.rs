// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker error surfaces.

use thiserror::Error;

/// Failure while enumerating a discovery source.
///
/// Discovery failures never kill the worker: the tick is skipped, a warning
/// event is recorded, and the next interval retries.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid source configuration: {0}")]
    Config(String),

    #[error("invalid cron schedule {schedule:?}: {reason}")]
    Schedule { schedule: String, reason: String },

    #[error("{1} request failed: {0}")]
    Http(#[source] reqwest::Error, &'static str),

    #[error("{0} returned status {1}")]
    Status(&'static str, u16),
}

/// Fatal worker failure (API access to its own TaskSpawner).
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("TaskSpawner {0:?} not found")]
    SpawnerGone(String),
}
