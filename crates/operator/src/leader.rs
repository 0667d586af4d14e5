// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease-based leader election.
//!
//! Only the lease holder runs the controllers; standbys keep trying and
//! take over when the holder stops renewing. Reconcile is idempotent, so
//! fail-over needs no handoff. Acquisition goes through a versioned
//! replace, so two standbys racing for an expired lease cannot both win.

use chrono::Utc;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::MicroTime;
use kube::api::{Api, ObjectMeta, PostParams};
use kube::Client;
use std::future::Future;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

const LEASE_NAME: &str = "axon-operator-lock";
const LEASE_TTL_SECS: i32 = 15;
const RENEW_EVERY: Duration = Duration::from_secs(5);

struct LeaseManager {
    api: Api<Lease>,
    identity: String,
}

impl LeaseManager {
    /// Returns whether this process holds the lease after the attempt.
    async fn try_acquire_or_renew(&self) -> Result<bool, kube::Error> {
        let now = MicroTime(Utc::now());
        let Some(existing) = self.api.get_opt(LEASE_NAME).await? else {
            let lease = self.desired(now);
            return match self.api.create(&PostParams::default(), &lease).await {
                Ok(_) => Ok(true),
                // Someone else created it first.
                Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(false),
                Err(e) => Err(e),
            };
        };

        let spec = existing.spec.clone().unwrap_or_default();
        let held_by_us = spec.holder_identity.as_deref() == Some(self.identity.as_str());
        let expired = spec
            .renew_time
            .as_ref()
            .map(|t| {
                let age = Utc::now().signed_duration_since(t.0).num_seconds();
                age >= i64::from(spec.lease_duration_seconds.unwrap_or(LEASE_TTL_SECS))
            })
            .unwrap_or(true);

        if !held_by_us && !expired {
            return Ok(false);
        }

        // Renew or take over through a versioned replace; a lost race 409s.
        let mut updated = existing;
        let transitions = updated.spec.as_ref().and_then(|s| s.lease_transitions).unwrap_or(0);
        updated.spec = Some(LeaseSpec {
            holder_identity: Some(self.identity.clone()),
            lease_duration_seconds: Some(LEASE_TTL_SECS),
            acquire_time: if held_by_us { spec.acquire_time } else { Some(now.clone()) },
            renew_time: Some(now),
            lease_transitions: Some(if held_by_us { transitions } else { transitions + 1 }),
            ..Default::default()
        });
        match self.api.replace(LEASE_NAME, &PostParams::default(), &updated).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn desired(&self, now: MicroTime) -> Lease {
        Lease {
            metadata: ObjectMeta { name: Some(LEASE_NAME.to_string()), ..Default::default() },
            spec: Some(LeaseSpec {
                holder_identity: Some(self.identity.clone()),
                lease_duration_seconds: Some(LEASE_TTL_SECS),
                acquire_time: Some(now.clone()),
                renew_time: Some(now),
                lease_transitions: Some(0),
                ..Default::default()
            }),
        }
    }
}

/// Run `controllers` gated behind the operator lease.
///
/// With election disabled the future runs immediately. With it enabled, the
/// future is spawned on lease acquisition and aborted on loss or shutdown.
pub async fn run_leased<F, Fut>(
    enabled: bool,
    client: Client,
    namespace: &str,
    shutdown: CancellationToken,
    controllers: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    if !enabled {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = controllers() => {}
        }
        return;
    }

    // Unique identity per replica; the Downward API supplies POD_NAME.
    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("axond-{}", uuid::Uuid::new_v4()));
    let manager =
        LeaseManager { api: Api::namespaced(client, namespace), identity };

    let mut controller_task: Option<tokio::task::JoinHandle<()>> = None;
    let mut tick = tokio::time::interval(RENEW_EVERY);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                if let Some(task) = controller_task.take() {
                    task.abort();
                    task.await.ok();
                }
                return;
            }
            _ = tick.tick() => {}
        }

        let leading = match manager.try_acquire_or_renew().await {
            Ok(leading) => leading,
            Err(e) => {
                // Unable to confirm leadership; stop leading until we can.
                tracing::warn!(error = %e, "lease renew/acquire failed");
                if let Some(task) = controller_task.take() {
                    task.abort();
                }
                continue;
            }
        };

        if leading {
            if controller_task.is_none() {
                tracing::info!(identity = %manager.identity, "acquired leadership, starting controllers");
                controller_task = Some(tokio::spawn(controllers()));
            }
        } else if let Some(task) = controller_task.take() {
            tracing::warn!("lost leadership, stopping controllers");
            task.abort();
        }
    }
}
