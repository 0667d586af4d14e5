// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawner worker entrypoint.
//!
//! The operator runs one of these per TaskSpawner, passing the spawner's
//! name and namespace on the command line.

use clap::Parser;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "axon-spawner", about = "Axon TaskSpawner discovery worker")]
struct Args {
    /// Name of the TaskSpawner this worker serves.
    #[arg(long)]
    name: String,

    /// Namespace of the TaskSpawner.
    #[arg(long)]
    namespace: String,

    /// Run a single discovery tick and exit.
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let client = kube::Client::try_default().await?;
    let worker = axon_spawner::Worker::new(client, args.namespace, args.name);

    if args.once {
        worker.tick_once().await;
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    worker.run(shutdown).await?;
    Ok(())
}
