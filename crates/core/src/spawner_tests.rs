// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn cron_source() -> TaskSource {
    TaskSource {
        cron: Some(CronSource { schedule: "* * * * *".to_string() }),
        ..Default::default()
    }
}

#[test]
fn exactly_one_source_is_required() {
    assert_eq!(TaskSource::default().validate(), Err(SourceError::Empty));
    assert_eq!(cron_source().validate(), Ok(()));

    let both = TaskSource {
        git_hub_issues: Some(GitHubIssuesSource::default()),
        cron: Some(CronSource { schedule: "* * * * *".to_string() }),
        ..Default::default()
    };
    assert_eq!(both.validate(), Err(SourceError::Ambiguous(2)));
}

#[test]
fn when_field_uses_spec_wire_names() {
    let spec = TaskSpawnerSpec {
        when: TaskSource {
            git_hub_issues: Some(GitHubIssuesSource {
                labels: vec!["bug".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        },
        poll_interval: "1m".to_string(),
        ..Default::default()
    };
    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(value["when"]["gitHubIssues"]["labels"][0], "bug");
    assert_eq!(value["pollInterval"], "1m");
}

#[test]
fn suspend_defaults_to_false() {
    let spawner = TaskSpawner::new("nightly", TaskSpawnerSpec::default());
    assert!(!spawner.is_suspended());
}
