// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axon_core::task::{Credentials, CredentialsKind, LocalRef, PodOverrides, TaskSpec};
use axon_core::workspace::WorkspaceSpec;
use axon_core::AgentKind;
use clap::Parser;

fn config() -> OperatorConfig {
    OperatorConfig::parse_from(["axond"])
}

fn task() -> Task {
    let mut task = Task::new(
        "demo",
        TaskSpec {
            agent: AgentKind::ClaudeCode,
            prompt: "raw prompt".to_string(),
            credentials: Credentials {
                kind: CredentialsKind::ApiKey,
                secret_ref: LocalRef::new("claude-creds"),
            },
            ..Default::default()
        },
    );
    task.metadata.namespace = Some("agents".to_string());
    task.metadata.uid = Some("uid-1".to_string());
    task
}

fn workspace() -> Workspace {
    Workspace::new(
        "repo",
        WorkspaceSpec {
            repo: "https://github.com/acme/widgets.git".to_string(),
            git_ref: Some("main".to_string()),
            secret_ref: Some(LocalRef::new("gh-creds")),
        },
    )
}

fn pod_of(job: &Job) -> &PodSpec {
    job.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
}

#[test]
fn job_shape_matches_contract() {
    let task = task();
    let params = JobParams {
        task: &task,
        workspace: None,
        agent_config: None,
        prompt: "rendered",
        git_secret: None,
    };
    let job = build_job(&params, &config()).unwrap();

    assert_eq!(job.metadata.name.as_deref(), Some("demo"));
    assert_eq!(job.metadata.namespace.as_deref(), Some("agents"));

    let spec = job.spec.as_ref().unwrap();
    assert_eq!(spec.backoff_limit, Some(0));
    assert_eq!(spec.active_deadline_seconds, None);

    let template_labels = spec.template.metadata.as_ref().unwrap().labels.as_ref().unwrap();
    assert_eq!(template_labels.get(TASK_LABEL).map(String::as_str), Some("demo"));

    let pod = pod_of(&job);
    assert_eq!(pod.restart_policy.as_deref(), Some("Never"));
    assert!(pod.init_containers.is_none());
    assert_eq!(pod.containers.len(), 1);
}

#[test]
fn owner_reference_points_at_task() {
    let task = task();
    let params = JobParams {
        task: &task,
        workspace: None,
        agent_config: None,
        prompt: "p",
        git_secret: None,
    };
    let job = build_job(&params, &config()).unwrap();
    let owners = job.metadata.owner_references.unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].kind, "Task");
    assert_eq!(owners[0].name, "demo");
}

#[test]
fn agent_container_runs_agent_then_capture() {
    let task = task();
    let params = JobParams {
        task: &task,
        workspace: None,
        agent_config: None,
        prompt: "rendered prompt",
        git_secret: None,
    };
    let job = build_job(&params, &config()).unwrap();
    let agent = &pod_of(&job).containers[0];

    assert_eq!(agent.name, "claude-code");
    assert_eq!(agent.working_dir.as_deref(), Some("/workspace"));

    let script = &agent.args.as_ref().unwrap()[0];
    assert!(script.contains("run-agent"));
    assert!(script.contains("tee /tmp/agent-output.jsonl"));
    assert!(script.contains("axon-capture"));

    let env = agent.env.as_ref().unwrap();
    let get = |name: &str| env.iter().find(|e| e.name == name);
    assert_eq!(get("AXON_AGENT_TYPE").and_then(|e| e.value.as_deref()), Some("claude-code"));
    assert_eq!(get("AXON_PROMPT").and_then(|e| e.value.as_deref()), Some("rendered prompt"));

    let env_from = agent.env_from.as_ref().unwrap();
    assert_eq!(
        env_from[0].secret_ref.as_ref().map(|s| s.name.as_str()),
        Some("claude-creds")
    );
}

#[test]
fn workspace_adds_clone_init_container() {
    let task = task();
    let ws = workspace();
    let params = JobParams {
        task: &task,
        workspace: Some(&ws),
        agent_config: None,
        prompt: "p",
        git_secret: Some("demo-github-token"),
    };
    let job = build_job(&params, &config()).unwrap();
    let pod = pod_of(&job);

    let init = &pod.init_containers.as_ref().unwrap()[0];
    assert_eq!(init.name, "clone");
    let clone_script = &init.args.as_ref().unwrap()[0];
    assert!(clone_script.contains("https://github.com/acme/widgets.git"));
    assert!(clone_script.contains("--branch 'main'"));
    assert!(clone_script.contains("/workspace"));

    // Token comes from the materialized secret, optionally.
    let token = init.env.as_ref().unwrap().iter().find(|e| e.name == "GITHUB_TOKEN").unwrap();
    let key_ref = token.value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
    assert_eq!(key_ref.name, "demo-github-token");

    // The agent sees the base branch of the workspace ref.
    let agent = &pod.containers[0];
    let base = agent.env.as_ref().unwrap().iter().find(|e| e.name == "AXON_BASE_BRANCH");
    assert_eq!(base.and_then(|e| e.value.as_deref()), Some("main"));
}

#[test]
fn pod_overrides_apply() {
    let mut task = task();
    task.spec.pod_overrides = Some(PodOverrides {
        active_deadline_seconds: Some(1800),
        service_account_name: Some("agent-sa".to_string()),
        ..Default::default()
    });
    let params = JobParams {
        task: &task,
        workspace: None,
        agent_config: None,
        prompt: "p",
        git_secret: None,
    };
    let job = build_job(&params, &config()).unwrap();
    assert_eq!(job.spec.as_ref().unwrap().active_deadline_seconds, Some(1800));
    assert_eq!(pod_of(&job).service_account_name.as_deref(), Some("agent-sa"));
}

#[test]
fn task_image_override_reaches_container() {
    let mut task = task();
    task.spec.image = Some("custom/claude:pinned".to_string());
    let params = JobParams {
        task: &task,
        workspace: None,
        agent_config: None,
        prompt: "p",
        git_secret: None,
    };
    let job = build_job(&params, &config()).unwrap();
    assert_eq!(pod_of(&job).containers[0].image.as_deref(), Some("custom/claude:pinned"));
}

#[test]
fn clone_command_omits_branch_when_ref_unset() {
    let cmd = clone_command("https://github.com/acme/widgets.git", None);
    assert!(!cmd.contains("--branch"));
    assert!(cmd.contains("clone --depth 1"));
}

#[test]
fn empty_image_fails_the_build() {
    let mut task = task();
    task.spec.image = Some(String::new());
    let params = JobParams {
        task: &task,
        workspace: None,
        agent_config: None,
        prompt: "p",
        git_secret: None,
    };
    let err = build_job(&params, &config()).unwrap_err();
    assert!(matches!(err, ReconcileError::JobBuild(_)));
    assert_eq!(err.to_string(), "building Job: no image configured for agent type claude-code");
}
