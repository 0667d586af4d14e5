// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job composition for Tasks.
//!
//! One Job per Task: an optional init container that clones the workspace
//! into an emptyDir, then the agent container, which runs the agent and the
//! capture program as its terminal step. Agent images provide `run-agent`
//! and `axon-capture` on PATH.

use crate::config::OperatorConfig;
use crate::error::ReconcileError;
use axon_core::labels::{
    AGENT_LOG_PATH, AGENT_TYPE_ENV, BASE_BRANCH_ENV, CONTROL_PLANE_LABEL, CONTROL_PLANE_VALUE,
    TASK_LABEL,
};
use axon_core::{AgentConfig, Task, Workspace};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvFromSource, EnvVar, EnvVarSource, PodSpec,
    PodTemplateSpec, SecretEnvSource, SecretKeySelector, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

const WORKSPACE_VOLUME: &str = "workspace";
const WORKSPACE_PATH: &str = "/workspace";

/// Everything the builder needs, resolved by the reconciler.
pub struct JobParams<'a> {
    pub task: &'a Task,
    pub workspace: Option<&'a Workspace>,
    pub agent_config: Option<&'a AgentConfig>,
    /// Prompt after dependency-template rendering.
    pub prompt: &'a str,
    /// Name of the Secret mounted for git auth; either the Workspace's own
    /// secret or the per-Task installation token secret.
    pub git_secret: Option<&'a str>,
}

/// Compose the Job for a Task.
pub fn build_job(params: &JobParams<'_>, config: &OperatorConfig) -> Result<Job, ReconcileError> {
    let task = params.task;
    let name = task.name_any();
    let kind = task.spec.agent;

    let image = config.agent_image(kind, task.spec.image.as_deref());
    if image.is_empty() {
        return Err(ReconcileError::JobBuild(format!(
            "no image configured for agent type {kind}"
        )));
    }

    let labels = BTreeMap::from([
        (TASK_LABEL.to_string(), name.clone()),
        (CONTROL_PLANE_LABEL.to_string(), CONTROL_PLANE_VALUE.to_string()),
    ]);

    let volumes = vec![Volume {
        name: WORKSPACE_VOLUME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }];

    let workspace_mount = VolumeMount {
        name: WORKSPACE_VOLUME.to_string(),
        mount_path: WORKSPACE_PATH.to_string(),
        ..Default::default()
    };

    let init_containers = params
        .workspace
        .map(|ws| vec![clone_container(ws, params.git_secret, config, &workspace_mount)]);

    let overrides = task.spec.pod_overrides.as_ref();

    let pod_spec = PodSpec {
        restart_policy: Some("Never".to_string()),
        init_containers,
        containers: vec![agent_container(params, config, &image, &workspace_mount)],
        volumes: Some(volumes),
        node_selector: overrides.and_then(|o| o.node_selector.clone()),
        service_account_name: overrides.and_then(|o| o.service_account_name.clone()),
        ..Default::default()
    };

    let mut owner_references = Vec::new();
    if let Some(owner) = task.controller_owner_ref(&()) {
        owner_references.push(owner);
    }

    Ok(Job {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: task.namespace(),
            labels: Some(labels.clone()),
            owner_references: Some(owner_references),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            active_deadline_seconds: overrides.and_then(|o| o.active_deadline_seconds),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        status: None,
    })
}

/// Init container cloning the workspace repo into the shared volume.
fn clone_container(
    workspace: &Workspace,
    git_secret: Option<&str>,
    config: &OperatorConfig,
    workspace_mount: &VolumeMount,
) -> Container {
    let mut env = Vec::new();
    if let Some(secret) = git_secret {
        env.push(secret_env("GITHUB_TOKEN", secret, "GITHUB_TOKEN", true));
    }

    Container {
        name: "clone".to_string(),
        image: Some(config.git_image.clone()),
        command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
        args: Some(vec![clone_command(&workspace.spec.repo, workspace.spec.git_ref.as_deref())]),
        env: Some(env),
        volume_mounts: Some(vec![workspace_mount.clone()]),
        ..Default::default()
    }
}

/// Shell line cloning `repo` at `git_ref` into the workspace path.
///
/// Auth goes through a credential helper reading `GITHUB_TOKEN` so the token
/// never appears in the remote URL or process list.
pub fn clone_command(repo: &str, git_ref: Option<&str>) -> String {
    let branch = git_ref.map(|r| format!(" --branch '{r}'")).unwrap_or_default();
    format!(
        "git -c credential.helper='!f() {{ echo username=x-access-token; echo \"password=$GITHUB_TOKEN\"; }}; f' \
         clone --depth 1{branch} '{repo}' {WORKSPACE_PATH}"
    )
}

/// The agent container: runs the agent, tees its NDJSON log, then captures.
fn agent_container(
    params: &JobParams<'_>,
    config: &OperatorConfig,
    image: &str,
    workspace_mount: &VolumeMount,
) -> Container {
    let task = params.task;
    let kind = task.spec.agent;

    let mut env = vec![
        plain_env(AGENT_TYPE_ENV, kind.as_str()),
        plain_env("AXON_PROMPT", params.prompt),
        plain_env("AXON_TASK_NAME", &task.name_any()),
    ];
    if let Some(ref model) = task.spec.model {
        env.push(plain_env("AXON_MODEL", model));
    }
    if let Some(ref branch) = task.spec.branch {
        env.push(plain_env("AXON_BRANCH", branch));
    }
    if let Some(ws) = params.workspace {
        if let Some(ref base) = ws.spec.git_ref {
            env.push(plain_env(BASE_BRANCH_ENV, base));
        }
    }
    if let Some(secret) = params.git_secret {
        env.push(secret_env("GITHUB_TOKEN", secret, "GITHUB_TOKEN", true));
    }
    if let Some(ac) = params.agent_config {
        env.extend(agent_config_env(ac));
    }

    // All keys of the credentials secret surface as environment variables;
    // each agent image picks the ones it understands.
    let env_from = vec![EnvFromSource {
        secret_ref: Some(SecretEnvSource {
            name: task.spec.credentials.secret_ref.name.clone(),
            optional: Some(false),
        }),
        ..Default::default()
    }];

    let script = format!(
        "set -o pipefail; run-agent 2>&1 | tee {AGENT_LOG_PATH}; rc=$?; axon-capture; exit $rc"
    );

    Container {
        name: kind.as_str().to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(config.image_pull_policy.clone()),
        command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
        args: Some(vec![script]),
        working_dir: Some(WORKSPACE_PATH.to_string()),
        env: Some(env),
        env_from: Some(env_from),
        volume_mounts: Some(vec![workspace_mount.clone()]),
        ..Default::default()
    }
}

/// AgentConfig materialized as environment.
fn agent_config_env(config: &AgentConfig) -> Vec<EnvVar> {
    let mut env = Vec::new();
    if let Some(ref agents_md) = config.spec.agents_md {
        env.push(plain_env("AXON_AGENTS_MD", agents_md));
    }
    if !config.spec.plugins.is_empty() {
        env.push(plain_env("AXON_PLUGINS", &config.spec.plugins.join(",")));
    }
    if !config.spec.marketplace_plugins.is_empty() {
        env.push(plain_env(
            "AXON_MARKETPLACE_PLUGINS",
            &config.spec.marketplace_plugins.join(","),
        ));
    }
    if !config.spec.mcp_servers.is_empty() {
        match serde_json::to_string(&config.spec.mcp_servers) {
            Ok(json) => env.push(plain_env("AXON_MCP_SERVERS", &json)),
            Err(e) => tracing::warn!(error = %e, "mcp server serialization failed"),
        }
    }
    env
}

fn plain_env(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

fn secret_env(name: &str, secret: &str, key: &str, optional: bool) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.to_string(),
                key: key.to_string(),
                optional: Some(optional),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
