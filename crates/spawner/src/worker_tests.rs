// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axon_core::spawner::{CronSource, TaskSource, TaskSpawnerSpec};
use axon_core::task::TaskSpec;
use axon_core::AgentKind;

fn spawner_with_prompt(prompt: &str) -> TaskSpawner {
    let mut spawner = TaskSpawner::new(
        "triage",
        TaskSpawnerSpec {
            when: TaskSource {
                cron: Some(CronSource { schedule: "* * * * *".to_string() }),
                ..Default::default()
            },
            task_template: TaskSpec {
                agent: AgentKind::ClaudeCode,
                prompt: prompt.to_string(),
                ..Default::default()
            },
            poll_interval: "1m".to_string(),
            suspend: None,
        },
    );
    spawner.metadata.namespace = Some("agents".to_string());
    spawner.metadata.uid = Some("uid-123".to_string());
    spawner
}

#[test]
fn build_task_renders_item_fields_into_prompt() {
    let spawner = spawner_with_prompt("triage issue #{{ .Number }}: {{ .Title }}");
    let item = DiscoveredItem::new("issue/42").var("Number", "42").var("Title", "crash");
    let task = build_task(&spawner, "triage-abcdef0123", &item);
    assert_eq!(task.spec.prompt, "triage issue #42: crash");
    assert_eq!(task.metadata.name.as_deref(), Some("triage-abcdef0123"));
    assert_eq!(task.metadata.namespace.as_deref(), Some("agents"));
}

#[test]
fn build_task_falls_back_to_raw_prompt_on_missing_field() {
    let spawner = spawner_with_prompt("handle {{ .Missing }}");
    let item = DiscoveredItem::new("issue/1").var("Title", "x");
    let task = build_task(&spawner, "triage-1", &item);
    assert_eq!(task.spec.prompt, "handle {{ .Missing }}");
}

#[test]
fn build_task_carries_spawner_label_and_owner() {
    let spawner = spawner_with_prompt("p");
    let item = DiscoveredItem::new("cron/2026-03-01T12:00:00Z");
    let task = build_task(&spawner, "triage-feed", &item);

    let labels = task.metadata.labels.unwrap();
    assert_eq!(labels.get(SPAWNER_LABEL).map(String::as_str), Some("triage"));
    assert_eq!(labels.get(CONTROL_PLANE_LABEL).map(String::as_str), Some(CONTROL_PLANE_VALUE));

    let owners = task.metadata.owner_references.unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].kind, "TaskSpawner");
    assert_eq!(owners[0].name, "triage");
    assert_eq!(owners[0].controller, Some(true));
}

#[test]
fn template_agent_and_refs_survive_into_the_task() {
    let mut spawner = spawner_with_prompt("p");
    spawner.spec.task_template.branch = Some("axon/auto".to_string());
    let task = build_task(&spawner, "triage-1", &DiscoveredItem::new("issue/9"));
    assert_eq!(task.spec.agent, AgentKind::ClaudeCode);
    assert_eq!(task.spec.branch.as_deref(), Some("axon/auto"));
}
