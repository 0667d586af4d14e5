// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axon_core::spawner::{CronSource, JiraSource, TaskSource, TaskSpawnerSpec};
use axon_core::task::LocalRef;
use clap::Parser;

fn config() -> crate::config::OperatorConfig {
    crate::config::OperatorConfig::parse_from(["axond"])
}

fn spawner(suspend: Option<bool>) -> TaskSpawner {
    let mut spawner = TaskSpawner::new(
        "nightly",
        TaskSpawnerSpec {
            when: TaskSource {
                cron: Some(CronSource { schedule: "0 3 * * *".to_string() }),
                ..Default::default()
            },
            poll_interval: "1m".to_string(),
            suspend,
            ..Default::default()
        },
    );
    spawner.metadata.namespace = Some("agents".to_string());
    spawner.metadata.uid = Some("uid-9".to_string());
    spawner
}

#[test]
fn deployment_runs_one_worker_replica() {
    let deployment = build_deployment(&spawner(None), &config(), None);
    assert_eq!(deployment.metadata.name.as_deref(), Some("nightly"));

    let spec = deployment.spec.as_ref().unwrap();
    assert_eq!(spec.replicas, Some(1));

    let pod = spec.template.spec.as_ref().unwrap();
    assert_eq!(pod.containers.len(), 1);
    let args = pod.containers[0].args.as_ref().unwrap();
    assert_eq!(args, &["--name", "nightly", "--namespace", "agents"]);
}

#[test]
fn suspend_scales_to_zero() {
    let deployment = build_deployment(&spawner(Some(true)), &config(), None);
    assert_eq!(deployment.spec.as_ref().unwrap().replicas, Some(0));
}

#[test]
fn deployment_is_owned_and_labeled() {
    let deployment = build_deployment(&spawner(None), &config(), None);
    let owners = deployment.metadata.owner_references.as_ref().unwrap();
    assert_eq!(owners[0].kind, "TaskSpawner");
    assert_eq!(owners[0].name, "nightly");

    let labels = deployment.metadata.labels.as_ref().unwrap();
    assert_eq!(labels.get(SPAWNER_LABEL).map(String::as_str), Some("nightly"));
    assert_eq!(labels.get(CONTROL_PLANE_LABEL).map(String::as_str), Some(CONTROL_PLANE_VALUE));
}

#[test]
fn token_secret_adds_env_and_refresher_sidecar() {
    let deployment = build_deployment(&spawner(None), &config(), Some("nightly-github-token"));
    let pod = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
    assert_eq!(pod.containers.len(), 2);
    assert_eq!(pod.containers[1].name, "token-refresher");

    let env = pod.containers[0].env.as_ref().unwrap();
    let token = env.iter().find(|e| e.name == "GITHUB_TOKEN").unwrap();
    let key_ref = token.value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
    assert_eq!(key_ref.name, "nightly-github-token");
}

#[test]
fn jira_secret_is_wired_into_worker_env() {
    let mut spawner = spawner(None);
    spawner.spec.when = TaskSource {
        jira: Some(JiraSource {
            base_url: "https://acme.atlassian.net".to_string(),
            project: "PROJ".to_string(),
            secret_ref: Some(LocalRef::new("jira-token")),
        }),
        ..Default::default()
    };
    let deployment = build_deployment(&spawner, &config(), None);
    let env = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
        .env
        .as_ref()
        .unwrap();
    let token = env.iter().find(|e| e.name == "JIRA_API_TOKEN").unwrap();
    assert_eq!(
        token.value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap().name,
        "jira-token"
    );
}

#[test]
fn phase_follows_suspend_then_availability() {
    assert_eq!(spawner_phase(true, 1), SpawnerPhase::Suspended);
    assert_eq!(spawner_phase(true, 0), SpawnerPhase::Suspended);
    assert_eq!(spawner_phase(false, 1), SpawnerPhase::Running);
    assert_eq!(spawner_phase(false, 0), SpawnerPhase::Pending);
}
