// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller error surface.

use thiserror::Error;

/// Failures bubbling out of a reconcile.
///
/// Anything returned here lands in the controller's error policy and gets a
/// backoff requeue. Configuration failures that must *not* retry are
/// absorbed inside the reconciler by failing the Task instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("object has no {0}")]
    MissingObjectKey(&'static str),

    #[error("building Job: {0}")]
    JobBuild(String),

    #[error("generating installation token: {0}")]
    GitHubToken(#[from] crate::github::GitHubTokenError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
