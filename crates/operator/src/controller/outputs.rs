// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output ingestion from pod logs.

use axon_core::outputs;
use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, LogParams};
use std::collections::BTreeMap;

/// Parsed outputs block ready to be written into Task status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub lines: Vec<String>,
    pub results: BTreeMap<String, String>,
}

/// Read the tail of the agent container's log.
pub async fn read_pod_tail(
    pods: &Api<Pod>,
    pod_name: &str,
    container: &str,
    tail_lines: i64,
) -> Result<String, kube::Error> {
    pods.logs(
        pod_name,
        &LogParams {
            container: Some(container.to_string()),
            tail_lines: Some(tail_lines),
            ..Default::default()
        },
    )
    .await
}

/// Extract the marker block from a log tail.
///
/// `None` means the markers were not (or not yet) in the tail; the caller
/// decides whether the retry window is still open.
pub fn ingest_tail(tail: &str) -> Option<CaptureOutcome> {
    let lines = outputs::extract_block(tail)?;
    let results = outputs::results_map(&lines);
    Some(CaptureOutcome { lines, results })
}

/// Whether capture retries are still allowed for a Task that completed at
/// `completion`.
pub fn within_capture_window(
    completion: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    now.signed_duration_since(completion) <= window
}

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;
