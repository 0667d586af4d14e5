// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent kind enumeration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// The kind of coding agent a Task invokes.
///
/// Wire names match the CLI names of the agents themselves
/// (`claude-code`, `codex`, `gemini`, `opencode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    #[default]
    ClaudeCode,
    Codex,
    Gemini,
    Opencode,
}

impl AgentKind {
    /// All known kinds, in declaration order.
    pub const ALL: [AgentKind; 4] = [
        AgentKind::ClaudeCode,
        AgentKind::Codex,
        AgentKind::Gemini,
        AgentKind::Opencode,
    ];

    /// Wire/container name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::ClaudeCode => "claude-code",
            AgentKind::Codex => "codex",
            AgentKind::Gemini => "gemini",
            AgentKind::Opencode => "opencode",
        }
    }
}

crate::simple_display! {
    AgentKind {
        ClaudeCode => "claude-code",
        Codex => "codex",
        Gemini => "gemini",
        Opencode => "opencode",
    }
}

/// Error for unrecognized agent kind strings.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown agent type: {0}")]
pub struct UnknownAgentKind(pub String);

impl FromStr for AgentKind {
    type Err = UnknownAgentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude-code" => Ok(AgentKind::ClaudeCode),
            "codex" => Ok(AgentKind::Codex),
            "gemini" => Ok(AgentKind::Gemini),
            "opencode" => Ok(AgentKind::Opencode),
            other => Err(UnknownAgentKind(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
