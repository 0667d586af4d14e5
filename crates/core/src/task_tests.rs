// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn phase_terminality() {
    assert!(TaskPhase::Succeeded.is_terminal());
    assert!(TaskPhase::Failed.is_terminal());
    for phase in [TaskPhase::Unset, TaskPhase::Pending, TaskPhase::Waiting, TaskPhase::Running] {
        assert!(!phase.is_terminal(), "{phase:?} must not be terminal");
    }
}

#[test]
fn unset_phase_serializes_as_empty_string() {
    let json = serde_json::to_string(&TaskPhase::Unset).unwrap();
    assert_eq!(json, "\"\"");
    let back: TaskPhase = serde_json::from_str("\"\"").unwrap();
    assert_eq!(back, TaskPhase::Unset);
}

#[test]
fn status_defaults_to_unset_phase() {
    let status: TaskStatus = serde_json::from_str("{}").unwrap();
    assert_eq!(status.phase, TaskPhase::Unset);
    assert!(status.outputs.is_empty());
}

#[test]
fn spec_wire_names_are_camel_case() {
    let spec = TaskSpec {
        agent: AgentKind::ClaudeCode,
        prompt: "fix the bug".to_string(),
        credentials: Credentials {
            kind: CredentialsKind::Oauth,
            secret_ref: LocalRef::new("claude-creds"),
        },
        depends_on: vec!["build".to_string()],
        ttl_seconds_after_finished: Some(300),
        ..Default::default()
    };
    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(value["type"], "claude-code");
    assert_eq!(value["credentials"]["type"], "oauth");
    assert_eq!(value["credentials"]["secretRef"]["name"], "claude-creds");
    assert_eq!(value["dependsOn"][0], "build");
    assert_eq!(value["ttlSecondsAfterFinished"], 300);
}

#[test]
fn task_phase_accessor_tolerates_missing_status() {
    let task = Task::new("demo", TaskSpec::default());
    assert_eq!(task.phase(), TaskPhase::Unset);
    assert!(task.outputs().is_empty());
}
