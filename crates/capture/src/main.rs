// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture entrypoint: print the outputs block, or nothing at all.
//!
//! stdout is the wire: only the marker block may be written to it.
//! Diagnostics go to stderr.

use axon_core::outputs::render_block;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let lines = axon_capture::collect_lines().await;
    if let Some(block) = render_block(&lines) {
        print!("{block}");
    } else {
        tracing::info!("no outputs to report");
    }
}
