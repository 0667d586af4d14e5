// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Task` custom resource: one invocation of a coding agent.

use crate::agent::AgentKind;
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a sibling namespaced resource by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct LocalRef {
    pub name: String,
}

impl LocalRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// How the agent authenticates against its model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsKind {
    #[default]
    ApiKey,
    Oauth,
}

crate::simple_display! {
    CredentialsKind {
        ApiKey => "api-key",
        Oauth => "oauth",
    }
}

/// Credential source for the agent container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(rename = "type")]
    pub kind: CredentialsKind,
    pub secret_ref: LocalRef,
}

/// Narrow pod-level knobs a Task may override on its Job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct PodOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_deadline_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

/// Desired state of a Task.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "axon.io",
    version = "v1alpha1",
    kind = "Task",
    namespaced,
    status = "TaskStatus",
    shortname = "tk",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Which agent runs this task.
    #[serde(rename = "type")]
    pub agent: AgentKind,
    /// The prompt handed to the agent. May contain `{{ ... }}` placeholders
    /// resolved against dependency outputs (see the template module).
    pub prompt: String,
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_ref: Option<LocalRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_config_ref: Option<LocalRef>,
    /// Names of sibling Tasks that must succeed before this one starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Seconds after completion at which the Task is garbage-collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds_after_finished: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Override of the per-kind agent image configured on the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_overrides: Option<PodOverrides>,
}

/// Lifecycle phase of a Task.
///
/// `Succeeded` and `Failed` are absorbing: once observed, the reconciler
/// never transitions out of them short of deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum TaskPhase {
    #[default]
    #[serde(rename = "")]
    Unset,
    Pending,
    Waiting,
    Running,
    Succeeded,
    Failed,
}

impl TaskPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Succeeded | TaskPhase::Failed)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, TaskPhase::Unset)
    }
}

crate::simple_display! {
    TaskPhase {
        Unset => "",
        Pending => "Pending",
        Waiting => "Waiting",
        Running => "Running",
        Succeeded => "Succeeded",
        Failed => "Failed",
    }
}

/// Observed state of a Task, written only by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(default)]
    pub phase: TaskPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw `key: value` lines captured from the pod log block, in order,
    /// duplicates preserved. Appended exactly once per completion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Last-write-wins map of the unique keys in `outputs`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub results: BTreeMap<String, String>,
}

impl Task {
    /// Current phase, defaulting to `Unset` when status is absent.
    pub fn phase(&self) -> TaskPhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    /// Captured output lines, empty when none were ingested.
    pub fn outputs(&self) -> &[String] {
        self.status.as_ref().map(|s| s.outputs.as_slice()).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
