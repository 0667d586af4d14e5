// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron tick discovery.
//!
//! Each scheduled tick between the cursor (last successful discovery) and
//! now becomes one item keyed `cron/<RFC3339 of the scheduled minute, UTC>`.
//! The key is derived from the schedule, not the wall clock, so a worker
//! restarted mid-minute recomputes the same key and the Task create
//! collapses onto the existing child.

use super::{DiscoveredItem, DiscoverySource};
use crate::error::DiscoveryError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Upper bound of ticks replayed in one discovery, for a worker that was
/// down for a long time.
const MAX_CATCHUP_TICKS: usize = 10;

#[derive(Debug)]
pub struct CronTicks {
    schedule: Schedule,
    /// Ticks strictly after this instant are due.
    cursor: DateTime<Utc>,
    now: DateTime<Utc>,
}

impl CronTicks {
    /// Build from a five-field cron expression and the last successful
    /// discovery time. Without a cursor, discovery starts one minute back,
    /// allowing at most one catch-up tick on first run.
    pub fn new(
        expression: &str,
        cursor: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, DiscoveryError> {
        // The cron crate expects a seconds field; prepend one for the
        // standard five-field form.
        let with_seconds = format!("0 {expression}");
        let schedule =
            Schedule::from_str(&with_seconds).map_err(|e| DiscoveryError::Schedule {
                schedule: expression.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { schedule, cursor: cursor.unwrap_or(now - Duration::minutes(1)), now })
    }

    /// The due ticks, oldest first.
    pub fn due(&self) -> Vec<DateTime<Utc>> {
        self.schedule
            .after(&self.cursor)
            .take_while(|t| *t <= self.now)
            .take(MAX_CATCHUP_TICKS)
            .collect()
    }
}

/// Dedup key for a scheduled tick.
pub fn tick_key(tick: DateTime<Utc>) -> String {
    format!("cron/{}", tick.format("%Y-%m-%dT%H:%M:%SZ"))
}

#[async_trait]
impl DiscoverySource for CronTicks {
    async fn discover(&self) -> Result<Vec<DiscoveredItem>, DiscoveryError> {
        Ok(self
            .due()
            .into_iter()
            .map(|tick| {
                DiscoveredItem::new(tick_key(tick))
                    .var("ScheduledTime", tick.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
