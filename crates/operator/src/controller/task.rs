// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Task state machine.
//!
//! `"" | Waiting` → dependency gate, credential resolution, Job create →
//! `Pending` → `Running` → `Succeeded | Failed`. Terminal phases are
//! absorbing; after them only output capture (bounded by the capture
//! window) and TTL expiry run. Deletion is handled through the finalizer:
//! the owned Job is removed before the finalizer is.

use super::outputs::{ingest_tail, read_pod_tail, within_capture_window, CaptureOutcome};
use super::{deps, job, Ctx};
use crate::error::{ReconcileError, Result};
use crate::github::GitHubAppCredentials;
use crate::status::update_status_with_retry;
use axon_core::labels::{CONTROL_PLANE_LABEL, CONTROL_PLANE_VALUE, TASK_FINALIZER, TASK_LABEL};
use axon_core::{template, AgentConfig, Task, TaskPhase, Workspace};
use chrono::Utc;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, DeleteParams, ListParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::runtime::finalizer::{finalizer, Error as FinalizerError, Event as Finalizer};
use kube::{Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Entry point registered with the controller.
pub async fn reconcile(task: Arc<Task>, ctx: Arc<Ctx>) -> Result<Action> {
    ctx.metrics.reconciliations.with_label_values(&["task"]).inc();
    let ns = task.namespace().ok_or(ReconcileError::MissingObjectKey("namespace"))?;
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), &ns);

    finalizer(&tasks, TASK_FINALIZER, task, |event| async {
        match event {
            Finalizer::Apply(task) => apply(task, &ctx, &ns).await,
            Finalizer::Cleanup(task) => cleanup(task, &ctx, &ns).await,
        }
    })
    .await
    .map_err(|e| match e {
        FinalizerError::ApplyFailed(err) | FinalizerError::CleanupFailed(err) => err,
        FinalizerError::AddFinalizer(e) | FinalizerError::RemoveFinalizer(e) => {
            ReconcileError::Kube(e)
        }
        FinalizerError::UnnamedObject => ReconcileError::MissingObjectKey("name"),
        FinalizerError::InvalidFinalizer => ReconcileError::MissingObjectKey("valid finalizer"),
    })
}

/// Deletion path: drop the owned Job, then let the finalizer go.
async fn cleanup(task: Arc<Task>, ctx: &Ctx, ns: &str) -> Result<Action> {
    let job_name = task
        .status
        .as_ref()
        .and_then(|s| s.job_name.clone())
        .unwrap_or_else(|| task.name_any());
    let jobs: Api<Job> = Api::namespaced(ctx.client.clone(), ns);
    match jobs.delete(&job_name, &DeleteParams::background()).await {
        Ok(_) => tracing::info!(task = %task.name_any(), job = %job_name, "deleted owned job"),
        Err(kube::Error::Api(ae)) if ae.code == 404 => {}
        Err(e) => return Err(ReconcileError::Kube(e)),
    }
    Ok(Action::await_change())
}

async fn apply(task: Arc<Task>, ctx: &Ctx, ns: &str) -> Result<Action> {
    let phase = task.phase();
    if phase.is_terminal() {
        return finished(&task, ctx, ns).await;
    }
    match phase {
        TaskPhase::Pending | TaskPhase::Running => track(&task, ctx, ns).await,
        _ => prepare(&task, ctx, ns).await,
    }
}

// ---------------------------------------------------------------------------
// Pre-Job phases: dependencies, credentials, Job creation
// ---------------------------------------------------------------------------

async fn prepare(task: &Task, ctx: &Ctx, ns: &str) -> Result<Action> {
    let name = task.name_any();
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);

    let mut prompt = task.spec.prompt.clone();
    if !task.spec.depends_on.is_empty() {
        let siblings = tasks.list(&ListParams::default()).await?;
        let mut phases: BTreeMap<String, TaskPhase> = BTreeMap::new();
        let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut outputs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for sibling in &siblings.items {
            let Some(sibling_name) = sibling.metadata.name.clone() else { continue };
            phases.insert(sibling_name.clone(), sibling.phase());
            edges.insert(sibling_name.clone(), sibling.spec.depends_on.clone());
            outputs.insert(sibling_name, sibling.outputs().to_vec());
        }

        // Cycle detection runs once, before the first Waiting transition.
        if task.phase() != TaskPhase::Waiting {
            if let Some(cycle) = deps::find_cycle(&name, &edges) {
                return fail(
                    task,
                    ctx,
                    ns,
                    format!("Circular dependency detected: {}", cycle.join(" -> ")),
                    "TaskFailed",
                )
                .await;
            }
        }

        match deps::classify(&task.spec.depends_on, &phases) {
            deps::DepState::Missing(dep) => {
                return wait(
                    task,
                    ctx,
                    ns,
                    format!("Waiting for dependency {dep:?} to be created"),
                    Duration::from_secs(5),
                )
                .await;
            }
            deps::DepState::Failed(dep) => {
                return fail(task, ctx, ns, format!("Dependency {dep} failed"), "DependencyFailed")
                    .await;
            }
            deps::DepState::Pending(dep) => {
                return wait(
                    task,
                    ctx,
                    ns,
                    format!("Waiting for dependency {dep} to succeed"),
                    Duration::from_secs(10),
                )
                .await;
            }
            deps::DepState::Ready => {
                prompt = render_prompt(task, &outputs);
            }
        }
    }

    // Referenced resources must exist before the Job can be composed.
    let workspace = match task.spec.workspace_ref.as_ref() {
        Some(r) => {
            let workspaces: Api<Workspace> = Api::namespaced(ctx.client.clone(), ns);
            match workspaces.get_opt(&r.name).await? {
                Some(ws) => Some(ws),
                None => {
                    return pause(task, ctx, ns, format!("Waiting for workspace {:?}", r.name))
                        .await;
                }
            }
        }
        None => None,
    };
    let agent_config = match task.spec.agent_config_ref.as_ref() {
        Some(r) => {
            let configs: Api<AgentConfig> = Api::namespaced(ctx.client.clone(), ns);
            match configs.get_opt(&r.name).await? {
                Some(ac) => Some(ac),
                None => {
                    return pause(task, ctx, ns, format!("Waiting for agent config {:?}", r.name))
                        .await;
                }
            }
        }
        None => None,
    };

    // Workspace auth: a GitHub App triple becomes a per-Task token secret.
    let mut git_secret = workspace
        .as_ref()
        .and_then(|ws| ws.spec.secret_ref.as_ref())
        .map(|r| r.name.clone());
    if let Some(secret_name) = git_secret.clone() {
        let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), ns);
        let Some(secret) = secrets.get_opt(&secret_name).await? else {
            return pause(task, ctx, ns, format!("Waiting for secret {secret_name:?}")).await;
        };
        if let Some(parsed) = GitHubAppCredentials::from_secret(&secret) {
            let creds = match parsed {
                Ok(creds) => creds,
                Err(e) => {
                    return fail(
                        task,
                        ctx,
                        ns,
                        format!("generating installation token: {e}"),
                        "GitHubTokenFailed",
                    )
                    .await;
                }
            };
            match ctx.github.fetch(&creds).await {
                Ok(token) => {
                    git_secret =
                        Some(materialize_token_secret(task, ctx, ns, &token.token).await?);
                }
                Err(e) => {
                    return fail(
                        task,
                        ctx,
                        ns,
                        format!("generating installation token: {e}"),
                        "GitHubTokenFailed",
                    )
                    .await;
                }
            }
        }
    }

    let params = job::JobParams {
        task,
        workspace: workspace.as_ref(),
        agent_config: agent_config.as_ref(),
        prompt: &prompt,
        git_secret: git_secret.as_deref(),
    };
    let desired = match job::build_job(&params, &ctx.config) {
        Ok(job) => job,
        Err(e) => {
            return fail(task, ctx, ns, e.to_string(), "JobBuildFailed").await;
        }
    };

    let jobs: Api<Job> = Api::namespaced(ctx.client.clone(), ns);
    match jobs.create(&PostParams::default(), &desired).await {
        Ok(created) => {
            let job_name = created.name_any();
            update_status_with_retry(&tasks, &name, |t| {
                let status = t.status.get_or_insert_with(Default::default);
                if status.phase.is_terminal() {
                    return;
                }
                status.phase = TaskPhase::Pending;
                status.job_name = Some(job_name.clone());
                status.message = Some(format!("Created Job {job_name:?}"));
            })
            .await?;
            ctx.publish(
                task,
                EventType::Normal,
                "TaskCreated",
                format!("Created Job {job_name:?}"),
            )
            .await;
            Ok(Action::requeue(Duration::from_secs(5)))
        }
        // Next reconcile picks up the existing Job.
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(Action::requeue(Duration::ZERO)),
        Err(e) => Err(ReconcileError::Kube(e)),
    }
}

/// Render the dependency template, keeping the raw prompt on any error.
fn render_prompt(task: &Task, outputs: &BTreeMap<String, Vec<String>>) -> String {
    let mut data = template::TemplateData::new();
    for dep in &task.spec.depends_on {
        data = data.with_dep(dep.clone(), outputs.get(dep).cloned().unwrap_or_default());
    }
    match template::render(&task.spec.prompt, &data) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!(task = %task.name_any(), error = %e, "prompt template failed, using raw prompt");
            task.spec.prompt.clone()
        }
    }
}

/// Create or refresh the per-Task installation token secret.
async fn materialize_token_secret(
    task: &Task,
    ctx: &Ctx,
    ns: &str,
    token: &str,
) -> Result<String> {
    let name = format!("{}-github-token", task.name_any());
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), ns);

    let mut owner_references = Vec::new();
    if let Some(owner) = task.controller_owner_ref(&()) {
        owner_references.push(owner);
    }
    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(ns.to_string()),
            labels: Some(BTreeMap::from([
                (TASK_LABEL.to_string(), task.name_any()),
                (CONTROL_PLANE_LABEL.to_string(), CONTROL_PLANE_VALUE.to_string()),
            ])),
            owner_references: Some(owner_references),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([("GITHUB_TOKEN".to_string(), token.to_string())])),
        ..Default::default()
    };

    match secrets.create(&PostParams::default(), &secret).await {
        Ok(_) => {}
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            let patch = json!({"stringData": {"GITHUB_TOKEN": token}});
            secrets.patch(&name, &PatchParams::default(), &Patch::Merge(patch)).await?;
        }
        Err(e) => return Err(ReconcileError::Kube(e)),
    }
    Ok(name)
}

// ---------------------------------------------------------------------------
// Job status ingestion
// ---------------------------------------------------------------------------

async fn track(task: &Task, ctx: &Ctx, ns: &str) -> Result<Action> {
    let name = task.name_any();
    let jobs: Api<Job> = Api::namespaced(ctx.client.clone(), ns);
    let job_name = task
        .status
        .as_ref()
        .and_then(|s| s.job_name.clone())
        .unwrap_or_else(|| name.clone());

    let Some(job) = jobs.get_opt(&job_name).await? else {
        tracing::warn!(task = %name, job = %job_name, "tracked job is gone");
        return Ok(Action::requeue(Duration::from_secs(10)));
    };
    let job_status = job.status.unwrap_or_default();

    let pod_name = match task.status.as_ref().and_then(|s| s.pod_name.clone()) {
        Some(pod) => Some(pod),
        None => discover_pod(ctx, ns, &name).await?,
    };

    if job_status.succeeded.unwrap_or(0) > 0 {
        return complete(task, ctx, ns, TaskPhase::Succeeded, pod_name).await;
    }
    if job_status.failed.unwrap_or(0) > 0 {
        return complete(task, ctx, ns, TaskPhase::Failed, pod_name).await;
    }

    if job_status.active.unwrap_or(0) > 0 && task.phase() != TaskPhase::Running {
        let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
        let now = Utc::now();
        update_status_with_retry(&tasks, &name, |t| {
            let status = t.status.get_or_insert_with(Default::default);
            if status.phase.is_terminal() {
                return;
            }
            status.phase = TaskPhase::Running;
            if status.start_time.is_none() {
                status.start_time = Some(now);
            }
            status.message = Some("Job is running".to_string());
            if status.pod_name.is_none() {
                status.pod_name = pod_name.clone();
            }
        })
        .await?;
        ctx.publish(task, EventType::Normal, "TaskRunning", "Job is running".to_string()).await;
    } else if let Some(ref pod) = pod_name {
        if task.status.as_ref().map(|s| s.pod_name.is_none()).unwrap_or(true) {
            let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
            let pod = pod.clone();
            update_status_with_retry(&tasks, &name, move |t| {
                let status = t.status.get_or_insert_with(Default::default);
                if status.pod_name.is_none() {
                    status.pod_name = Some(pod.clone());
                }
            })
            .await?;
        }
    }

    Ok(Action::requeue(Duration::from_secs(10)))
}

/// First pod carrying the Task label.
async fn discover_pod(ctx: &Ctx, ns: &str, task_name: &str) -> Result<Option<String>> {
    let pods: Api<Pod> = Api::namespaced(ctx.client.clone(), ns);
    let list = pods
        .list(&ListParams::default().labels(&format!("{TASK_LABEL}={task_name}")).limit(1))
        .await?;
    Ok(list.items.into_iter().next().and_then(|p| p.metadata.name))
}

/// Terminal transition: completion time, duration metric, first capture try.
async fn complete(
    task: &Task,
    ctx: &Ctx,
    ns: &str,
    phase: TaskPhase,
    pod_name: Option<String>,
) -> Result<Action> {
    let name = task.name_any();
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
    let now = Utc::now();
    let message = match phase {
        TaskPhase::Succeeded => "Job completed successfully".to_string(),
        _ => "Job failed".to_string(),
    };

    let updated = update_status_with_retry(&tasks, &name, |t| {
        let status = t.status.get_or_insert_with(Default::default);
        if status.phase.is_terminal() {
            return;
        }
        status.phase = phase;
        if status.start_time.is_none() {
            status.start_time = Some(now);
        }
        status.completion_time = Some(now);
        status.message = Some(message.clone());
        if status.pod_name.is_none() {
            status.pod_name = pod_name.clone();
        }
    })
    .await?;

    if let Some(status) = updated.status.as_ref() {
        if let (Some(start), Some(end)) = (status.start_time, status.completion_time) {
            let elapsed = end.signed_duration_since(start).num_milliseconds() as f64 / 1000.0;
            ctx.metrics
                .task_duration_seconds
                .with_label_values(&[&phase.to_string()])
                .observe(elapsed.max(0.0));
        }
    }

    match phase {
        TaskPhase::Succeeded => {
            ctx.publish(task, EventType::Normal, "TaskSucceeded", message).await;
        }
        _ => {
            ctx.publish(task, EventType::Warning, "TaskFailed", message).await;
        }
    }

    // First capture attempt rides on the same reconcile.
    if attempt_capture(&updated, ctx, ns).await? {
        Ok(Action::await_change())
    } else {
        Ok(Action::requeue(ctx.config.capture_retry()))
    }
}

// ---------------------------------------------------------------------------
// Terminal phases: capture retries and TTL
// ---------------------------------------------------------------------------

async fn finished(task: &Task, ctx: &Ctx, ns: &str) -> Result<Action> {
    let name = task.name_any();
    let now = Utc::now();
    let completion = task
        .status
        .as_ref()
        .and_then(|s| s.completion_time)
        .unwrap_or(now);

    let mut next: Option<Duration> = None;

    if task.outputs().is_empty() && within_capture_window(completion, now, ctx.config.capture_window())
    {
        if !attempt_capture(task, ctx, ns).await? {
            next = Some(ctx.config.capture_retry());
        }
    }

    if let Some(ttl) = task.spec.ttl_seconds_after_finished {
        let expiry = completion + chrono::Duration::seconds(ttl.max(0));
        if now >= expiry {
            let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
            ctx.publish(
                task,
                EventType::Normal,
                "TaskExpired",
                format!("TTL of {ttl}s expired, deleting Task"),
            )
            .await;
            match tasks.delete(&name, &DeleteParams::default()).await {
                Ok(_) => {}
                Err(kube::Error::Api(ae)) if ae.code == 404 => {}
                Err(e) => return Err(ReconcileError::Kube(e)),
            }
            return Ok(Action::await_change());
        }
        let remaining = (expiry - now)
            .to_std()
            .unwrap_or_else(|_| Duration::from_secs(0));
        next = Some(next.map_or(remaining, |d| d.min(remaining)));
    }

    Ok(next.map_or_else(Action::await_change, Action::requeue))
}

/// Try to read and ingest the outputs block once.
///
/// Returns whether outputs are now present in status. Log-read failures are
/// transient and count as a miss.
async fn attempt_capture(task: &Task, ctx: &Ctx, ns: &str) -> Result<bool> {
    if !task.outputs().is_empty() {
        return Ok(true);
    }
    let name = task.name_any();

    let pod_name = match task.status.as_ref().and_then(|s| s.pod_name.clone()) {
        Some(pod) => pod,
        None => match discover_pod(ctx, ns, &name).await? {
            Some(pod) => pod,
            None => return Ok(false),
        },
    };

    let pods: Api<Pod> = Api::namespaced(ctx.client.clone(), ns);
    let tail = match read_pod_tail(
        &pods,
        &pod_name,
        task.spec.agent.as_str(),
        ctx.config.log_tail_lines,
    )
    .await
    {
        Ok(tail) => tail,
        Err(e) => {
            tracing::debug!(task = %name, pod = %pod_name, error = %e, "pod log read failed");
            return Ok(false);
        }
    };

    let Some(CaptureOutcome { lines, results }) = ingest_tail(&tail) else {
        return Ok(false);
    };

    let count = lines.len();
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
    update_status_with_retry(&tasks, &name, |t| {
        let status = t.status.get_or_insert_with(Default::default);
        // Outputs are append-once per completion.
        if status.outputs.is_empty() {
            status.outputs = lines.clone();
            status.results = results.clone();
            status.pod_name.get_or_insert_with(|| pod_name.clone());
        }
    })
    .await?;
    ctx.publish(
        task,
        EventType::Normal,
        "OutputsCaptured",
        format!("Captured {count} output line(s)"),
    )
    .await;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Status helpers
// ---------------------------------------------------------------------------

/// Park the Task in `Waiting` and come back after `delay`.
async fn wait(task: &Task, ctx: &Ctx, ns: &str, message: String, delay: Duration) -> Result<Action> {
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
    update_status_with_retry(&tasks, &task.name_any(), |t| {
        let status = t.status.get_or_insert_with(Default::default);
        if status.phase.is_terminal() {
            return;
        }
        status.phase = TaskPhase::Waiting;
        status.message = Some(message.clone());
    })
    .await?;
    Ok(Action::requeue(delay))
}

/// Keep the phase, update the message, retry shortly (missing references).
async fn pause(task: &Task, ctx: &Ctx, ns: &str, message: String) -> Result<Action> {
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
    update_status_with_retry(&tasks, &task.name_any(), |t| {
        let status = t.status.get_or_insert_with(Default::default);
        if status.phase.is_terminal() {
            return;
        }
        status.message = Some(message.clone());
    })
    .await?;
    Ok(Action::requeue(Duration::from_secs(2)))
}

/// Terminal configuration failure: `Failed`, completion time, warning event.
async fn fail(task: &Task, ctx: &Ctx, ns: &str, message: String, reason: &str) -> Result<Action> {
    let tasks: Api<Task> = Api::namespaced(ctx.client.clone(), ns);
    let now = Utc::now();
    update_status_with_retry(&tasks, &task.name_any(), |t| {
        let status = t.status.get_or_insert_with(Default::default);
        if status.phase.is_terminal() {
            return;
        }
        status.phase = TaskPhase::Failed;
        if status.completion_time.is_none() {
            status.completion_time = Some(now);
        }
        status.message = Some(message.clone());
    })
    .await?;
    ctx.publish(task, EventType::Warning, reason, message).await;
    Ok(Action::await_change())
}
