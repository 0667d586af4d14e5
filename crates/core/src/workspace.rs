// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Workspace` custom resource: a reusable git-repository contract.

use crate::task::LocalRef;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A git repository plus optional checkout ref and auth secret.
///
/// Workspaces are referenced by many Tasks and never owned; the controller
/// reads them at Job-build time and treats them as immutable.
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[kube(group = "axon.io", version = "v1alpha1", kind = "Workspace", namespaced, shortname = "ws")]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    /// Clone URL, e.g. `https://github.com/acme/widgets.git`.
    pub repo: String,
    /// Branch, tag, or SHA to check out. Defaults to the remote HEAD.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// Secret with either a plain `GITHUB_TOKEN` or a GitHub App triple
    /// (`appID`, `installationID`, `privateKey`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalRef>,
}
