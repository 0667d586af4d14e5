// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! axon-core: API types and pure logic for the Axon operator.
//!
//! Defines the four custom resources (`Task`, `Workspace`, `AgentConfig`,
//! `TaskSpawner`), the agent kind enumeration, the prompt template engine,
//! and the pod-log outputs codec shared by the controller and the in-pod
//! capture binary. No Kubernetes client calls live here.

pub mod macros;

pub mod agent;
pub mod agent_config;
pub mod labels;
pub mod outputs;
pub mod spawner;
pub mod task;
pub mod template;
pub mod workspace;

pub use agent::AgentKind;
pub use agent_config::{AgentConfig, AgentConfigSpec, McpServer};
pub use outputs::{OUTPUTS_END_MARKER, OUTPUTS_START_MARKER};
pub use spawner::{
    CronSource, GitHubIssuesSource, JiraSource, SpawnerPhase, TaskSource, TaskSpawner,
    TaskSpawnerSpec, TaskSpawnerStatus,
};
pub use task::{
    Credentials, CredentialsKind, LocalRef, PodOverrides, Task, TaskPhase, TaskSpec, TaskStatus,
};
pub use template::{render, DepOutputs, TemplateData, TemplateError};
pub use workspace::{Workspace, WorkspaceSpec};
