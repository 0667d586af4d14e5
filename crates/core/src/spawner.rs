// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `TaskSpawner` custom resource: a periodic Task factory.

use crate::task::{LocalRef, TaskSpec};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GitHub issue discovery filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitHubIssuesSource {
    /// Issue types to include (e.g. `issue`, `pull-request`). Empty = issues only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_labels: Vec<String>,
    /// `open`, `closed`, or `all`. Defaults to `open`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Cron tick discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct CronSource {
    /// Standard five-field cron expression.
    pub schedule: String,
}

/// Jira project discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct JiraSource {
    /// Jira site base URL, e.g. `https://acme.atlassian.net`.
    pub base_url: String,
    pub project: String,
    /// Secret holding the API token the worker authenticates with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalRef>,
}

/// Which external source the spawner polls. Exactly one must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hub_issues: Option<GitHubIssuesSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<CronSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraSource>,
}

/// Error for a `when` clause that does not select exactly one source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("spec.when must configure exactly one source, found none")]
    Empty,
    #[error("spec.when must configure exactly one source, found {0}")]
    Ambiguous(usize),
}

impl TaskSource {
    /// Number of configured sources.
    fn configured(&self) -> usize {
        [
            self.git_hub_issues.is_some(),
            self.cron.is_some(),
            self.jira.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    /// Enforce the exactly-one-of contract.
    pub fn validate(&self) -> Result<(), SourceError> {
        match self.configured() {
            0 => Err(SourceError::Empty),
            1 => Ok(()),
            n => Err(SourceError::Ambiguous(n)),
        }
    }
}

/// Desired state of a TaskSpawner.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "axon.io",
    version = "v1alpha1",
    kind = "TaskSpawner",
    namespaced,
    status = "TaskSpawnerStatus",
    shortname = "tsp",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Tasks","type":"integer","jsonPath":".status.totalTasksCreated"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpawnerSpec {
    /// The discovery source. Exactly one variant must be configured.
    pub when: TaskSource,
    /// Skeleton of the Tasks to create; its `prompt` is a per-item template.
    pub task_template: TaskSpec,
    /// Human duration between discovery ticks, e.g. `1m`, `30s`.
    pub poll_interval: String,
    /// When true, the spawner Deployment is scaled to zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
}

/// Lifecycle phase of a TaskSpawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum SpawnerPhase {
    #[default]
    Pending,
    Running,
    Failed,
    Suspended,
}

crate::simple_display! {
    SpawnerPhase {
        Pending => "Pending",
        Running => "Running",
        Failed => "Failed",
        Suspended => "Suspended",
    }
}

/// Observed state of a TaskSpawner.
///
/// `phase`/`deploymentName`/`message` are written by the reconciler; the
/// discovery counters and timestamp are heartbeats written by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpawnerStatus {
    #[serde(default)]
    pub phase: SpawnerPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    #[serde(default)]
    pub total_discovered: i64,
    #[serde(default)]
    pub total_tasks_created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_discovery_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskSpawner {
    /// Whether the spawner is administratively suspended.
    pub fn is_suspended(&self) -> bool {
        self.spec.suspend.unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
