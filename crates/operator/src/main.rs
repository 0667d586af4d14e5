// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator entrypoint.

use axon_operator::controller::{self, Ctx};
use axon_operator::{config::OperatorConfig, leader, metrics::Metrics, probes};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = OperatorConfig::parse();
    let client = kube::Client::try_default().await?;
    let metrics = Arc::new(Metrics::new()?);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    let readiness = probes::Readiness::default();
    tokio::spawn({
        let addr = config.health_probe_bind_address.clone();
        let readiness = readiness.clone();
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = probes::serve_health(&addr, readiness, shutdown).await {
                tracing::error!(error = %e, "health endpoint failed");
            }
        }
    });
    tokio::spawn({
        let addr = config.metrics_bind_address.clone();
        let metrics = metrics.clone();
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = probes::serve_metrics(&addr, metrics, shutdown).await {
                tracing::error!(error = %e, "metrics endpoint failed");
            }
        }
    });

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let leader_elect = config.leader_elect;
    let ctx = Arc::new(Ctx::new(client.clone(), config, metrics));

    readiness.mark_ready();
    tracing::info!(leader_elect, "axond starting controllers");

    leader::run_leased(leader_elect, client, &lease_namespace, shutdown, move || {
        let ctx = ctx.clone();
        async move { controller::run_controllers(ctx).await }
    })
    .await;

    Ok(())
}
