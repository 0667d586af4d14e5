// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The discovery tick loop.

use crate::error::{DiscoveryError, WorkerError};
use crate::naming;
use crate::sources::{cron::CronTicks, github::GitHubIssues, jira::JiraIssues};
use crate::sources::{DiscoveredItem, DiscoverySource};
use axon_core::labels::{CONTROL_PLANE_LABEL, CONTROL_PLANE_VALUE, SPAWNER_LABEL};
use axon_core::{template, Task, TaskSpawner, Workspace};
use chrono::Utc;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fallback when `spec.pollInterval` is absent or unparseable.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// What one tick did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub discovered: usize,
    pub created: usize,
}

pub struct Worker {
    client: Client,
    namespace: String,
    name: String,
    recorder: Recorder,
}

impl Worker {
    pub fn new(client: Client, namespace: String, name: String) -> Self {
        let reporter = Reporter {
            controller: "axon-spawner".to_string(),
            instance: Some(name.clone()),
        };
        let recorder = Recorder::new(client.clone(), reporter);
        Self { client, namespace, name, recorder }
    }

    /// Poll until cancelled. Each tick re-reads the TaskSpawner so interval,
    /// suspend, and template changes take effect without a restart.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        loop {
            let interval = self.tick_once().await;
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(spawner = %self.name, "worker shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// One fetch-and-tick cycle; returns the sleep until the next one.
    pub async fn tick_once(&self) -> Duration {
        let spawners: Api<TaskSpawner> = Api::namespaced(self.client.clone(), &self.namespace);
        let spawner = match spawners.get(&self.name).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(spawner = %self.name, error = %e, "failed to fetch spawner");
                return DEFAULT_POLL_INTERVAL;
            }
        };

        let interval = humantime::parse_duration(&spawner.spec.poll_interval).unwrap_or_else(|e| {
            tracing::warn!(
                spawner = %self.name,
                interval = %spawner.spec.poll_interval,
                error = %e,
                "unparseable pollInterval, using default"
            );
            DEFAULT_POLL_INTERVAL
        });

        if spawner.is_suspended() {
            tracing::debug!(spawner = %self.name, "suspended, skipping tick");
            return interval;
        }

        match self.tick(&spawner).await {
            Ok(outcome) => {
                tracing::info!(
                    spawner = %self.name,
                    discovered = outcome.discovered,
                    created = outcome.created,
                    "discovery tick complete"
                );
            }
            Err(e) => {
                tracing::warn!(spawner = %self.name, error = %e, "discovery failed, will retry");
                self.publish_event(
                    &spawner,
                    EventType::Warning,
                    "DiscoveryFailed",
                    &e.to_string(),
                )
                .await;
            }
        }
        interval
    }

    /// Discover items and create Tasks for the ones not yet seen.
    pub async fn tick(&self, spawner: &TaskSpawner) -> Result<TickOutcome, DiscoveryError> {
        spawner
            .spec
            .when
            .validate()
            .map_err(|e| DiscoveryError::Config(e.to_string()))?;

        let items = self.discover(spawner).await?;
        let mut outcome = TickOutcome { discovered: items.len(), created: 0 };

        let tasks: Api<Task> = Api::namespaced(self.client.clone(), &self.namespace);
        for item in &items {
            match self.create_task(&tasks, spawner, item).await {
                Ok(true) => outcome.created += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(key = %item.key, error = %e, "task creation failed");
                }
            }
        }

        self.heartbeat(&outcome).await;
        Ok(outcome)
    }

    async fn discover(&self, spawner: &TaskSpawner) -> Result<Vec<DiscoveredItem>, DiscoveryError> {
        let when = &spawner.spec.when;
        if let Some(ref filters) = when.git_hub_issues {
            let repo = self.workspace_repo(spawner).await?;
            let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
            return GitHubIssues::new(&repo, filters.clone(), token)?.discover().await;
        }
        if let Some(ref cron) = when.cron {
            let cursor = spawner.status.as_ref().and_then(|s| s.last_discovery_time);
            return CronTicks::new(&cron.schedule, cursor, Utc::now())?.discover().await;
        }
        if let Some(ref jira) = when.jira {
            let token = std::env::var("JIRA_API_TOKEN").ok().filter(|t| !t.is_empty());
            return JiraIssues::new(jira.clone(), token).discover().await;
        }
        Err(DiscoveryError::Config("no source configured".to_string()))
    }

    /// Repo URL of the Workspace the task template points at.
    async fn workspace_repo(&self, spawner: &TaskSpawner) -> Result<String, DiscoveryError> {
        let ws_ref = spawner.spec.task_template.workspace_ref.as_ref().ok_or_else(|| {
            DiscoveryError::Config(
                "gitHubIssues source requires taskTemplate.workspaceRef".to_string(),
            )
        })?;
        let workspaces: Api<Workspace> = Api::namespaced(self.client.clone(), &self.namespace);
        let workspace = workspaces.get(&ws_ref.name).await.map_err(|e| {
            DiscoveryError::Config(format!("workspace {:?} not readable: {e}", ws_ref.name))
        })?;
        Ok(workspace.spec.repo)
    }

    /// Create the Task for an item unless it already exists.
    ///
    /// Returns whether a new Task was created. The name is deterministic in
    /// (spawner, key), so concurrent workers collapse onto one child.
    async fn create_task(
        &self,
        tasks: &Api<Task>,
        spawner: &TaskSpawner,
        item: &DiscoveredItem,
    ) -> Result<bool, kube::Error> {
        let task_name = naming::task_name(&self.name, &item.key);
        if tasks.get_opt(&task_name).await?.is_some() {
            return Ok(false);
        }

        let task = build_task(spawner, &task_name, item);
        match tasks.create(&PostParams::default(), &task).await {
            Ok(_) => {
                tracing::info!(task = %task_name, key = %item.key, "created task");
                self.publish_event(
                    spawner,
                    EventType::Normal,
                    "TaskCreated",
                    &format!("Created Task {task_name} for {}", item.key),
                )
                .await;
                Ok(true)
            }
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Heartbeat discovery counters into status.
    ///
    /// Counters are best-effort and owned solely by the worker; a merge
    /// patch leaves the reconciler-owned fields untouched.
    async fn heartbeat(&self, outcome: &TickOutcome) {
        let spawners: Api<TaskSpawner> = Api::namespaced(self.client.clone(), &self.namespace);
        let current = match spawners.get(&self.name).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat fetch failed");
                return;
            }
        };
        let status = current.status.unwrap_or_default();
        let patch = json!({
            "status": {
                "totalDiscovered": status.total_discovered + outcome.discovered as i64,
                "totalTasksCreated": status.total_tasks_created + outcome.created as i64,
                "lastDiscoveryTime": Utc::now(),
            }
        });
        if let Err(e) = spawners
            .patch_status(&self.name, &PatchParams::default(), &Patch::Merge(patch))
            .await
        {
            tracing::warn!(error = %e, "heartbeat status patch failed");
        }
    }

    async fn publish_event(
        &self,
        spawner: &TaskSpawner,
        type_: EventType,
        reason: &str,
        note: &str,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(note.to_string()),
            action: "Discovering".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &spawner.object_ref(&())).await {
            tracing::debug!(error = %e, "event publish failed");
        }
    }
}

/// Materialize the Task for a discovered item from the spawner's template.
pub fn build_task(spawner: &TaskSpawner, task_name: &str, item: &DiscoveredItem) -> Task {
    let mut spec = spawner.spec.task_template.clone();
    spec.prompt = render_prompt(&spec.prompt, item);

    let mut task = Task::new(task_name, spec);
    task.metadata.namespace = spawner.namespace();
    task.metadata.labels = Some(BTreeMap::from([
        (SPAWNER_LABEL.to_string(), spawner.name_any()),
        (CONTROL_PLANE_LABEL.to_string(), CONTROL_PLANE_VALUE.to_string()),
    ]));
    if let Some(owner) = spawner.controller_owner_ref(&()) {
        task.metadata.owner_references = Some(vec![owner]);
    }
    task
}

/// Render the item template strictly, keeping the raw prompt on error.
fn render_prompt(raw: &str, item: &DiscoveredItem) -> String {
    let mut data = template::TemplateData::new();
    for (name, value) in &item.vars {
        data = data.with_field(name, value);
    }
    match template::render(raw, &data) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!(error = %e, "prompt template failed, using raw prompt");
            raw.to_string()
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
