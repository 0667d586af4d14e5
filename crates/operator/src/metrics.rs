// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prometheus metrics for the controllers.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Registry plus the instruments the controllers record into.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Reconcile invocations, labeled by controller.
    pub reconciliations: IntCounterVec,
    /// Reconcile errors, labeled by controller.
    pub reconcile_errors: IntCounterVec,
    /// Observed Task wall time (completion − start), labeled by terminal phase.
    pub task_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new("axon_reconciliations_total", "Reconcile invocations"),
            &["controller"],
        )?;
        let reconcile_errors = IntCounterVec::new(
            Opts::new("axon_reconcile_errors_total", "Failed reconciles"),
            &["controller"],
        )?;
        let task_duration_seconds = HistogramVec::new(
            HistogramOpts::new("axon_task_duration_seconds", "Task wall time to completion")
                .buckets(prometheus::exponential_buckets(1.0, 2.0, 14)?),
            &["phase"],
        )?;

        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(reconcile_errors.clone()))?;
        registry.register(Box::new(task_duration_seconds.clone()))?;

        Ok(Self { registry, reconciliations, reconcile_errors, task_duration_seconds })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            tracing::warn!(error = %e, "metrics encoding failed");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
