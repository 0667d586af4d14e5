// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    https = { "https://github.com/acme/widgets", "acme", "widgets" },
    https_git = { "https://github.com/acme/widgets.git", "acme", "widgets" },
    ssh = { "git@github.com:acme/widgets.git", "acme", "widgets" },
    trailing_slash = { "https://github.com/acme/widgets/", "acme", "widgets" },
)]
fn repo_urls_parse(url: &str, owner: &str, name: &str) {
    let repo = parse_repo_url(url).unwrap();
    assert_eq!(repo, RepoRef { owner: owner.to_string(), name: name.to_string() });
}

#[parameterized(
    not_github = { "https://gitlab.com/acme/widgets" },
    no_repo = { "https://github.com/acme" },
    empty = { "" },
)]
fn bad_repo_urls_are_rejected(url: &str) {
    assert!(parse_repo_url(url).is_err());
}

fn source(filters: GitHubIssuesSource, base: &str) -> GitHubIssues {
    GitHubIssues::new("https://github.com/acme/widgets", filters, Some("tok".to_string()))
        .unwrap()
        .with_api_base(base)
}

const LISTING: &str = r#"[
  {"number": 7, "title": "Crash on save", "body": "stack trace", "html_url": "https://github.com/acme/widgets/issues/7", "state": "open", "labels": [{"name": "bug"}], "user": {"login": "alice"}},
  {"number": 8, "title": "Add dark mode", "body": null, "html_url": "https://github.com/acme/widgets/issues/8", "state": "open", "labels": [{"name": "wontfix"}]},
  {"number": 9, "title": "Fix typo", "html_url": "https://github.com/acme/widgets/pull/9", "state": "open", "labels": [], "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/9"}}
]"#;

#[tokio::test]
async fn discovers_issues_with_filters_applied() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(mockito::Matcher::Regex("state=open".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LISTING)
        .create_async()
        .await;

    let filters = GitHubIssuesSource {
        exclude_labels: vec!["wontfix".to_string()],
        ..Default::default()
    };
    let items = source(filters, &server.url()).discover().await.unwrap();
    mock.assert_async().await;

    // #8 is excluded by label, #9 is a pull request and types defaults to issues.
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].key, "issue/7");
    assert_eq!(items[0].vars.get("Title").map(String::as_str), Some("Crash on save"));
    assert_eq!(items[0].vars.get("Author").map(String::as_str), Some("alice"));
}

#[tokio::test]
async fn pull_requests_are_included_when_requested() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(LISTING)
        .create_async()
        .await;

    let filters = GitHubIssuesSource {
        types: vec!["issue".to_string(), "pull-request".to_string()],
        ..Default::default()
    };
    let items = source(filters, &server.url()).discover().await.unwrap();
    let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["issue/7", "issue/8", "issue/9"]);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/issues")
        .match_query(mockito::Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let err = source(GitHubIssuesSource::default(), &server.url()).discover().await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Status("GitHub", 403)));
}
