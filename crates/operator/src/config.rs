// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator process configuration.
//!
//! Everything is a flag; the operator requires no environment variables.

use axon_core::AgentKind;
use clap::Parser;
use std::time::Duration;

/// Flags for `axond`.
#[derive(Parser, Debug, Clone)]
#[command(name = "axond", about = "Axon task operator")]
pub struct OperatorConfig {
    /// Image for claude-code agent Jobs.
    #[arg(long, default_value = "ghcr.io/axon/agent-claude-code:latest")]
    pub claude_code_image: String,

    /// Image for codex agent Jobs.
    #[arg(long, default_value = "ghcr.io/axon/agent-codex:latest")]
    pub codex_image: String,

    /// Image for gemini agent Jobs.
    #[arg(long, default_value = "ghcr.io/axon/agent-gemini:latest")]
    pub gemini_image: String,

    /// Image for opencode agent Jobs.
    #[arg(long, default_value = "ghcr.io/axon/agent-opencode:latest")]
    pub opencode_image: String,

    /// Pull policy applied to agent containers.
    #[arg(long, default_value = "IfNotPresent")]
    pub image_pull_policy: String,

    /// Image for TaskSpawner worker Deployments.
    #[arg(long, default_value = "ghcr.io/axon/spawner:latest")]
    pub spawner_image: String,

    /// Image for the GitHub App token refresher sidecar.
    #[arg(long, default_value = "ghcr.io/axon/token-refresher:latest")]
    pub token_refresher_image: String,

    /// Image for the init container that clones workspaces.
    #[arg(long, default_value = "alpine/git:latest")]
    pub git_image: String,

    /// Enable leader election (required for replicated deployments).
    #[arg(long, default_value_t = false)]
    pub leader_elect: bool,

    /// Bind address for the Prometheus metrics endpoint.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub metrics_bind_address: String,

    /// Bind address for health probes.
    #[arg(long, default_value = "0.0.0.0:8081")]
    pub health_probe_bind_address: String,

    /// How many trailing pod-log lines are searched for the outputs block.
    #[arg(long, default_value_t = 50)]
    pub log_tail_lines: i64,

    /// Seconds between output capture retries on a freshly finished Task.
    #[arg(long, default_value_t = 5)]
    pub capture_retry_seconds: u64,

    /// Seconds past completion after which output capture gives up.
    #[arg(long, default_value_t = 30)]
    pub capture_window_seconds: u64,
}

impl OperatorConfig {
    /// Agent image for a kind, honoring the per-Task override.
    pub fn agent_image(&self, kind: AgentKind, override_image: Option<&str>) -> String {
        if let Some(image) = override_image {
            return image.to_string();
        }
        match kind {
            AgentKind::ClaudeCode => self.claude_code_image.clone(),
            AgentKind::Codex => self.codex_image.clone(),
            AgentKind::Gemini => self.gemini_image.clone(),
            AgentKind::Opencode => self.opencode_image.clone(),
        }
    }

    pub fn capture_retry(&self) -> Duration {
        Duration::from_secs(self.capture_retry_seconds)
    }

    pub fn capture_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.capture_window_seconds as i64)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
