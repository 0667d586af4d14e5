// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery sources.
//!
//! A source turns external state into [`DiscoveredItem`]s: a stable dedup
//! key plus the fields the item exposes to the prompt template.

pub mod cron;
pub mod github;
pub mod jira;

use crate::error::DiscoveryError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// One candidate work item discovered on a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredItem {
    /// Stable dedup key, e.g. `issue/42`, `cron/2026-03-01T12:34:00Z`,
    /// `jira/PROJ-7`. Hashing this yields the Task name.
    pub key: String,
    /// Item fields addressable from the prompt template as `{{ .Field }}`.
    pub vars: BTreeMap<String, String>,
}

impl DiscoveredItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), vars: BTreeMap::new() }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

/// A pollable discovery source.
#[async_trait]
pub trait DiscoverySource {
    async fn discover(&self) -> Result<Vec<DiscoveredItem>, DiscoveryError>;
}
