// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller wiring.
//!
//! One controller per resource kind, multiplexed over the shared client.
//! The Task controller owns Jobs and additionally watches Tasks through a
//! reflector store so that a Task reaching a terminal phase re-enqueues
//! every Task depending on it.

pub mod deps;
pub mod job;
pub mod outputs;
pub mod spawner;
pub mod task;

use crate::config::OperatorConfig;
use crate::error::ReconcileError;
use crate::github::InstallationTokenClient;
use crate::metrics::Metrics;
use axon_core::{Task, TaskSpawner};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::runtime::reflector::ObjectRef;
use kube::runtime::{reflector, watcher, Controller};
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;

/// Shared state handed to every reconcile.
pub struct Ctx {
    pub client: Client,
    pub config: OperatorConfig,
    pub recorder: Recorder,
    pub github: InstallationTokenClient,
    pub metrics: Arc<Metrics>,
}

impl Ctx {
    pub fn new(client: Client, config: OperatorConfig, metrics: Arc<Metrics>) -> Self {
        let reporter = Reporter { controller: "axon-operator".to_string(), instance: None };
        let recorder = Recorder::new(client.clone(), reporter);
        Self { client, config, recorder, github: InstallationTokenClient::default(), metrics }
    }

    /// Publish an event for an object, swallowing publish failures.
    pub async fn publish<K>(&self, obj: &K, type_: EventType, reason: &str, note: String)
    where
        K: Resource<DynamicType = ()>,
    {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(note),
            action: "Reconciling".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &obj.object_ref(&())).await {
            tracing::debug!(error = %e, "event publish failed");
        }
    }
}

/// Run both controllers until the process is cancelled.
pub async fn run_controllers(ctx: Arc<Ctx>) {
    tokio::join!(run_task_controller(ctx.clone()), run_spawner_controller(ctx));
}

/// The Task controller: owns Jobs, watches sibling Tasks for dependents.
pub async fn run_task_controller(ctx: Arc<Ctx>) {
    let tasks: Api<Task> = Api::all(ctx.client.clone());
    let jobs: Api<Job> = Api::all(ctx.client.clone());

    // Reflector store backing the dependent-Task lookup.
    let (reader, writer) = reflector::store::<Task>();
    let dependents_watch = reflector(
        writer,
        watcher(Api::<Task>::all(ctx.client.clone()), watcher::Config::default()),
    );
    tokio::spawn(async move {
        dependents_watch
            .for_each(|event| async {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "task reflector error");
                }
            })
            .await;
    });

    let mapper = move |changed: Task| {
        if !changed.phase().is_terminal() {
            return Vec::new();
        }
        let name = changed.name_any();
        let namespace = changed.namespace();
        reader
            .state()
            .iter()
            .filter(|sibling| {
                sibling.namespace() == namespace && sibling.spec.depends_on.contains(&name)
            })
            .map(|sibling| ObjectRef::from_obj(sibling.as_ref()))
            .collect::<Vec<_>>()
    };

    Controller::new(tasks, watcher::Config::default())
        .owns(jobs, watcher::Config::default())
        .watches(Api::<Task>::all(ctx.client.clone()), watcher::Config::default(), mapper)
        .shutdown_on_signal()
        .run(task::reconcile, error_policy_task, ctx)
        .for_each(|result| async move {
            if let Err(e) = result {
                tracing::debug!(error = %e, "task reconcile errored");
            }
        })
        .await;
}

/// The TaskSpawner controller: owns the worker Deployments.
pub async fn run_spawner_controller(ctx: Arc<Ctx>) {
    let spawners: Api<TaskSpawner> = Api::all(ctx.client.clone());
    let deployments: Api<Deployment> = Api::all(ctx.client.clone());

    Controller::new(spawners, watcher::Config::default())
        .owns(deployments, watcher::Config::default())
        .shutdown_on_signal()
        .run(spawner::reconcile, error_policy_spawner, ctx)
        .for_each(|result| async move {
            if let Err(e) = result {
                tracing::debug!(error = %e, "spawner reconcile errored");
            }
        })
        .await;
}

// Errors requeue with a flat backoff; transient conditions clear quickly
// and configuration failures are absorbed as terminal phases instead.

fn error_policy_task(_obj: Arc<Task>, error: &ReconcileError, ctx: Arc<Ctx>) -> Action {
    tracing::warn!(error = %error, "task reconciliation error");
    ctx.metrics.reconcile_errors.with_label_values(&["task"]).inc();
    Action::requeue(Duration::from_secs(5))
}

fn error_policy_spawner(_obj: Arc<TaskSpawner>, error: &ReconcileError, ctx: Arc<Ctx>) -> Action {
    tracing::warn!(error = %error, "spawner reconciliation error");
    ctx.metrics.reconcile_errors.with_label_values(&["taskspawner"]).inc();
    Action::requeue(Duration::from_secs(5))
}
