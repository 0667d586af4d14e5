// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    claude = { AgentKind::ClaudeCode, "claude-code" },
    codex = { AgentKind::Codex, "codex" },
    gemini = { AgentKind::Gemini, "gemini" },
    opencode = { AgentKind::Opencode, "opencode" },
)]
fn round_trips_through_str(kind: AgentKind, name: &str) {
    assert_eq!(kind.to_string(), name);
    assert_eq!(name.parse::<AgentKind>().unwrap(), kind);
}

#[test]
fn wire_name_matches_serde() {
    for kind in AgentKind::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
}

#[test]
fn unknown_kind_is_rejected() {
    let err = "cursor".parse::<AgentKind>().unwrap_err();
    assert_eq!(err, UnknownAgentKind("cursor".to_string()));
}
