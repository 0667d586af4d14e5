// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub issue discovery.

use super::{DiscoveredItem, DiscoverySource};
use crate::error::DiscoveryError;
use async_trait::async_trait;
use axon_core::spawner::GitHubIssuesSource;
use serde::Deserialize;

const DEFAULT_API: &str = "https://api.github.com";
const PAGE_SIZE: u32 = 100;

/// `owner/name` parsed out of a workspace repo URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

/// Parse `https://github.com/acme/widgets.git` or
/// `git@github.com:acme/widgets.git` into a [`RepoRef`].
pub fn parse_repo_url(url: &str) -> Result<RepoRef, DiscoveryError> {
    let path = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.split_once("github.com/").map(|(_, rest)| rest))
        .ok_or_else(|| DiscoveryError::Config(format!("not a GitHub repo URL: {url}")))?;
    let path = path.trim_end_matches('/').trim_end_matches(".git");
    match path.split('/').collect::<Vec<_>>().as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => {
            Ok(RepoRef { owner: owner.to_string(), name: name.to_string() })
        }
        _ => Err(DiscoveryError::Config(format!("not a GitHub repo URL: {url}"))),
    }
}

#[derive(Debug, Deserialize)]
struct IssueLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IssueAuthor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Issue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    state: String,
    #[serde(default)]
    labels: Vec<IssueLabel>,
    #[serde(default)]
    user: Option<IssueAuthor>,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

pub struct GitHubIssues {
    repo: RepoRef,
    filters: GitHubIssuesSource,
    token: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl GitHubIssues {
    pub fn new(
        repo_url: &str,
        filters: GitHubIssuesSource,
        token: Option<String>,
    ) -> Result<Self, DiscoveryError> {
        Ok(Self {
            repo: parse_repo_url(repo_url)?,
            filters,
            token,
            api_base: DEFAULT_API.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Point at a different API host (tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn list_url(&self) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/issues?per_page={}&state={}",
            self.api_base,
            self.repo.owner,
            self.repo.name,
            PAGE_SIZE,
            self.filters.state.as_deref().unwrap_or("open"),
        );
        if !self.filters.labels.is_empty() {
            url.push_str("&labels=");
            url.push_str(&self.filters.labels.join(","));
        }
        url
    }

    /// Apply the client-side filters GitHub's list endpoint cannot express.
    fn keep(&self, issue: &Issue) -> bool {
        let wants_prs = self.filters.types.iter().any(|t| t == "pull-request");
        let wants_issues =
            self.filters.types.is_empty() || self.filters.types.iter().any(|t| t == "issue");
        match issue.pull_request {
            Some(_) if !wants_prs => return false,
            None if !wants_issues => return false,
            _ => {}
        }
        !issue
            .labels
            .iter()
            .any(|l| self.filters.exclude_labels.iter().any(|ex| *ex == l.name))
    }
}

fn item_from(issue: Issue) -> DiscoveredItem {
    DiscoveredItem::new(format!("issue/{}", issue.number))
        .var("Number", issue.number.to_string())
        .var("Title", issue.title)
        .var("Body", issue.body.unwrap_or_default())
        .var("URL", issue.html_url)
        .var("State", issue.state)
        .var("Author", issue.user.map(|u| u.login).unwrap_or_default())
}

#[async_trait]
impl DiscoverySource for GitHubIssues {
    async fn discover(&self) -> Result<Vec<DiscoveredItem>, DiscoveryError> {
        let mut req = self
            .client
            .get(self.list_url())
            .header("User-Agent", "axon-spawner")
            .header("Accept", "application/vnd.github+json");
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| DiscoveryError::Http(e, "GitHub"))?;
        if !resp.status().is_success() {
            return Err(DiscoveryError::Status("GitHub", resp.status().as_u16()));
        }
        let issues: Vec<Issue> =
            resp.json().await.map_err(|e| DiscoveryError::Http(e, "GitHub"))?;
        Ok(issues.into_iter().filter(|i| self.keep(i)).map(item_from).collect())
    }
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
