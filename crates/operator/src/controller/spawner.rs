// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The TaskSpawner reconciler.
//!
//! Converges each spawner onto a single-replica Deployment running the
//! discovery worker. `spec.suspend` scales the Deployment to zero and sets
//! `phase: Suspended` in the same reconcile; phase otherwise follows
//! Deployment availability. Discovery counters in status belong to the
//! worker and are never written here.

use super::Ctx;
use crate::error::{ReconcileError, Result};
use crate::github::GitHubAppCredentials;
use crate::status::update_status_with_retry;
use axon_core::labels::{CONTROL_PLANE_LABEL, CONTROL_PLANE_VALUE, SPAWNER_LABEL};
use axon_core::spawner::SpawnerPhase;
use axon_core::{TaskSpawner, Workspace};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, PodSpec, PodTemplateSpec, Secret, SecretKeySelector,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub async fn reconcile(spawner: Arc<TaskSpawner>, ctx: Arc<Ctx>) -> Result<Action> {
    ctx.metrics.reconciliations.with_label_values(&["taskspawner"]).inc();

    // Owner references cascade the Deployment; nothing else to clean up.
    if spawner.metadata.deletion_timestamp.is_some() {
        return Ok(Action::await_change());
    }

    let ns = spawner.namespace().ok_or(ReconcileError::MissingObjectKey("namespace"))?;
    let name = spawner.name_any();
    let spawners: Api<TaskSpawner> = Api::namespaced(ctx.client.clone(), &ns);

    if let Err(e) = spawner.spec.when.validate() {
        update_status_with_retry(&spawners, &name, |s| {
            let status = s.status.get_or_insert_with(Default::default);
            status.phase = SpawnerPhase::Failed;
            status.message = Some(e.to_string());
        })
        .await?;
        return Ok(Action::await_change());
    }

    // Per-spawner token secret for workers polling GitHub as an App.
    let token_secret = match resolve_app_secret(&spawner, &ctx, &ns).await {
        Ok(secret) => secret,
        Err(e) => {
            ctx.publish(spawner.as_ref(), EventType::Warning, "GitHubTokenFailed", e.to_string())
                .await;
            None
        }
    };

    let desired = build_deployment(&spawner, &ctx.config, token_secret.as_deref());
    let deployments: Api<Deployment> = Api::namespaced(ctx.client.clone(), &ns);
    let replicas = desired.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    match deployments.create(&PostParams::default(), &desired).await {
        Ok(_) => {
            tracing::info!(spawner = %name, "created spawner deployment");
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            // Propagate suspend/resume by scaling in place.
            let patch = json!({"spec": {"replicas": replicas}});
            deployments.patch(&name, &PatchParams::default(), &Patch::Merge(patch)).await?;
        }
        Err(e) => return Err(ReconcileError::Kube(e)),
    }

    let observed = deployments.get_opt(&name).await?;
    let available = observed
        .and_then(|d| d.status)
        .and_then(|s| s.available_replicas)
        .unwrap_or(0);
    let phase = spawner_phase(spawner.is_suspended(), available);

    update_status_with_retry(&spawners, &name, |s| {
        let status = s.status.get_or_insert_with(Default::default);
        status.phase = phase;
        status.deployment_name = Some(name.clone());
        status.message = Some(match phase {
            SpawnerPhase::Suspended => "Spawner is suspended".to_string(),
            SpawnerPhase::Running => "Worker is available".to_string(),
            SpawnerPhase::Pending => "Waiting for worker availability".to_string(),
            SpawnerPhase::Failed => "Spawner failed".to_string(),
        });
    })
    .await?;

    Ok(Action::requeue(Duration::from_secs(30)))
}

/// Suspend wins over availability; availability decides Pending vs Running.
pub fn spawner_phase(suspended: bool, available_replicas: i32) -> SpawnerPhase {
    if suspended {
        SpawnerPhase::Suspended
    } else if available_replicas > 0 {
        SpawnerPhase::Running
    } else {
        SpawnerPhase::Pending
    }
}

/// When the template's Workspace authenticates as a GitHub App, mint an
/// installation token into a per-spawner secret the worker (and its
/// refresher sidecar) reads. Returns the secret name, or `None` when the
/// App flow does not apply.
async fn resolve_app_secret(
    spawner: &TaskSpawner,
    ctx: &Ctx,
    ns: &str,
) -> Result<Option<String>> {
    let Some(ws_ref) = spawner.spec.task_template.workspace_ref.as_ref() else {
        return Ok(None);
    };
    let workspaces: Api<Workspace> = Api::namespaced(ctx.client.clone(), ns);
    let Some(workspace) = workspaces.get_opt(&ws_ref.name).await? else {
        return Ok(None);
    };
    let Some(secret_ref) = workspace.spec.secret_ref.as_ref() else {
        return Ok(None);
    };
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), ns);
    let Some(secret) = secrets.get_opt(&secret_ref.name).await? else {
        return Ok(None);
    };
    let Some(parsed) = GitHubAppCredentials::from_secret(&secret) else {
        // Plain token secret: the worker mounts it directly.
        return Ok(Some(secret_ref.name.clone()));
    };
    let creds = parsed?;
    let token = ctx.github.fetch(&creds).await?;

    let name = format!("{}-github-token", spawner.name_any());
    let mut owner_references = Vec::new();
    if let Some(owner) = spawner.controller_owner_ref(&()) {
        owner_references.push(owner);
    }
    let token_secret = Secret {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(ns.to_string()),
            labels: Some(BTreeMap::from([
                (SPAWNER_LABEL.to_string(), spawner.name_any()),
                (CONTROL_PLANE_LABEL.to_string(), CONTROL_PLANE_VALUE.to_string()),
            ])),
            owner_references: Some(owner_references),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([(
            "GITHUB_TOKEN".to_string(),
            token.token.clone(),
        )])),
        ..Default::default()
    };
    match secrets.create(&PostParams::default(), &token_secret).await {
        Ok(_) => {}
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            let patch = json!({"stringData": {"GITHUB_TOKEN": token.token}});
            secrets.patch(&name, &PatchParams::default(), &Patch::Merge(patch)).await?;
        }
        Err(e) => return Err(ReconcileError::Kube(e)),
    }
    Ok(Some(name))
}

/// Compose the worker Deployment for a spawner.
pub fn build_deployment(
    spawner: &TaskSpawner,
    config: &crate::config::OperatorConfig,
    token_secret: Option<&str>,
) -> Deployment {
    let name = spawner.name_any();
    let labels = BTreeMap::from([
        (SPAWNER_LABEL.to_string(), name.clone()),
        (CONTROL_PLANE_LABEL.to_string(), CONTROL_PLANE_VALUE.to_string()),
    ]);

    let mut env = Vec::new();
    if let Some(secret) = token_secret {
        env.push(EnvVar {
            name: "GITHUB_TOKEN".to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret.to_string(),
                    key: "GITHUB_TOKEN".to_string(),
                    optional: Some(true),
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
    }
    if let Some(jira) = spawner.spec.when.jira.as_ref() {
        if let Some(ref jira_secret) = jira.secret_ref {
            env.push(EnvVar {
                name: "JIRA_API_TOKEN".to_string(),
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: jira_secret.name.clone(),
                        key: "token".to_string(),
                        optional: Some(true),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
    }

    let worker = Container {
        name: "spawner".to_string(),
        image: Some(config.spawner_image.clone()),
        image_pull_policy: Some(config.image_pull_policy.clone()),
        args: Some(vec![
            "--name".to_string(),
            name.clone(),
            "--namespace".to_string(),
            spawner.namespace().unwrap_or_default(),
        ]),
        env: Some(env),
        ..Default::default()
    };

    let mut containers = vec![worker];
    if let Some(secret) = token_secret {
        containers.push(Container {
            name: "token-refresher".to_string(),
            image: Some(config.token_refresher_image.clone()),
            image_pull_policy: Some(config.image_pull_policy.clone()),
            args: Some(vec![
                "--namespace".to_string(),
                spawner.namespace().unwrap_or_default(),
                "--secret".to_string(),
                secret.to_string(),
            ]),
            ..Default::default()
        });
    }

    let mut owner_references = Vec::new();
    if let Some(owner) = spawner.controller_owner_ref(&()) {
        owner_references.push(owner);
    }

    let replicas = if spawner.is_suspended() { 0 } else { 1 };

    Deployment {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: spawner.namespace(),
            labels: Some(labels.clone()),
            owner_references: Some(owner_references),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels), ..Default::default() }),
                spec: Some(PodSpec { containers, ..Default::default() }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
