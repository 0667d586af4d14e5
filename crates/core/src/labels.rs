// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known names: API group, labels, finalizer, and log markers.

/// API group for all Axon custom resources.
pub const API_GROUP: &str = "axon.io";

/// API version for all Axon custom resources.
pub const API_VERSION: &str = "v1alpha1";

/// Label selecting the Job/pod belonging to a Task.
pub const TASK_LABEL: &str = "axon.io/task";

/// Label selecting resources created on behalf of a TaskSpawner.
pub const SPAWNER_LABEL: &str = "axon.io/taskspawner";

/// Label marking resources managed by the operator control plane.
pub const CONTROL_PLANE_LABEL: &str = "control-plane";

/// Value for [`CONTROL_PLANE_LABEL`].
pub const CONTROL_PLANE_VALUE: &str = "axon-operator";

/// Finalizer blocking Task deletion until the owned Job is gone.
pub const TASK_FINALIZER: &str = "axon.io/finalizer";

/// Environment variable carrying the agent kind into the capture binary.
pub const AGENT_TYPE_ENV: &str = "AXON_AGENT_TYPE";

/// Environment variable overriding the detected base branch.
pub const BASE_BRANCH_ENV: &str = "AXON_BASE_BRANCH";

/// Path where the agent container writes its NDJSON session log.
pub const AGENT_LOG_PATH: &str = "/tmp/agent-output.jsonl";
