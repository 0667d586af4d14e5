// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jira project discovery.

use super::{DiscoveredItem, DiscoverySource};
use crate::error::DiscoveryError;
use async_trait::async_trait;
use axon_core::spawner::JiraSource;
use serde::Deserialize;

const PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraFields,
}

#[derive(Debug, Deserialize)]
struct JiraFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<JiraStatus>,
}

#[derive(Debug, Deserialize)]
struct JiraStatus {
    name: String,
}

pub struct JiraIssues {
    config: JiraSource,
    /// API token; sent as a bearer credential.
    token: Option<String>,
}

impl JiraIssues {
    pub fn new(config: JiraSource, token: Option<String>) -> Self {
        Self { config, token }
    }

    fn search_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let jql = format!("project = {} ORDER BY created ASC", self.config.project);
        format!(
            "{base}/rest/api/2/search?maxResults={PAGE_SIZE}&jql={}",
            urlencode(&jql)
        )
    }
}

/// Minimal percent-encoding for the JQL query component.
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn item_from(issue: JiraIssue) -> DiscoveredItem {
    DiscoveredItem::new(format!("jira/{}", issue.key))
        .var("Key", issue.key.clone())
        .var("Summary", issue.fields.summary.unwrap_or_default())
        .var("Description", issue.fields.description.unwrap_or_default())
        .var("Status", issue.fields.status.map(|s| s.name).unwrap_or_default())
}

#[async_trait]
impl DiscoverySource for JiraIssues {
    async fn discover(&self) -> Result<Vec<DiscoveredItem>, DiscoveryError> {
        let mut req = reqwest::Client::new()
            .get(self.search_url())
            .header("Accept", "application/json");
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| DiscoveryError::Http(e, "Jira"))?;
        if !resp.status().is_success() {
            return Err(DiscoveryError::Status("Jira", resp.status().as_u16()));
        }
        let body: SearchResponse = resp.json().await.map_err(|e| DiscoveryError::Http(e, "Jira"))?;
        Ok(body.issues.into_iter().map(item_from).collect())
    }
}

#[cfg(test)]
#[path = "jira_tests.rs"]
mod tests;
