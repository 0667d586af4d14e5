// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-modify-write status updates.
//!
//! Conflicts are normal: the object is refetched and the mutation reapplied,
//! never reusing a stale copy across attempts.

use crate::error::{ReconcileError, Result};
use kube::api::{Api, PostParams};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

const MAX_ATTEMPTS: usize = 5;

/// Apply `mutate` to a fresh copy of the object and replace its status,
/// retrying on 409 up to [`MAX_ATTEMPTS`] times.
pub async fn update_status_with_retry<K, F>(api: &Api<K>, name: &str, mutate: F) -> Result<K>
where
    K: kube::Resource + Clone + DeserializeOwned + Serialize + Debug,
    F: Fn(&mut K),
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut obj = api.get(name).await?;
        mutate(&mut obj);
        let data = serde_json::to_vec(&obj)?;
        match api.replace_status(name, &PostParams::default(), data).await {
            Ok(updated) => return Ok(updated),
            Err(kube::Error::Api(ae)) if ae.code == 409 && attempt < MAX_ATTEMPTS => {
                tracing::debug!(%name, attempt, "status conflict, refetching");
            }
            Err(e) => return Err(ReconcileError::Kube(e)),
        }
    }
}
