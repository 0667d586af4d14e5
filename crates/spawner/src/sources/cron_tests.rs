// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, h, m, s).unwrap()
}

#[test]
fn every_minute_yields_one_tick_per_elapsed_minute() {
    let ticks = CronTicks::new("* * * * *", Some(at(12, 30, 0)), at(12, 33, 0)).unwrap();
    assert_eq!(ticks.due(), vec![at(12, 31, 0), at(12, 32, 0), at(12, 33, 0)]);
}

#[test]
fn no_cursor_allows_at_most_one_catchup_tick() {
    let ticks = CronTicks::new("* * * * *", None, at(12, 33, 30)).unwrap();
    assert_eq!(ticks.due(), vec![at(12, 33, 0)]);
}

#[test]
fn cursor_in_the_future_of_schedule_yields_nothing() {
    let ticks = CronTicks::new("0 0 * * *", Some(at(0, 0, 0)), at(12, 0, 0)).unwrap();
    assert!(ticks.due().is_empty());
}

#[test]
fn long_outage_is_bounded() {
    let ticks = CronTicks::new("* * * * *", Some(at(0, 0, 0)), at(12, 0, 0)).unwrap();
    assert_eq!(ticks.due().len(), 10);
}

#[test]
fn tick_key_is_minute_resolution_rfc3339() {
    assert_eq!(tick_key(at(12, 34, 0)), "cron/2026-03-01T12:34:00Z");
}

#[test]
fn restart_recomputes_identical_keys() {
    // Two workers computing the same window derive the same keys.
    let a = CronTicks::new("*/5 * * * *", Some(at(12, 0, 0)), at(12, 10, 0)).unwrap();
    let b = CronTicks::new("*/5 * * * *", Some(at(12, 0, 0)), at(12, 10, 0)).unwrap();
    let keys = |t: &CronTicks| t.due().into_iter().map(tick_key).collect::<Vec<_>>();
    assert_eq!(keys(&a), keys(&b));
    assert_eq!(keys(&a), vec!["cron/2026-03-01T12:05:00Z", "cron/2026-03-01T12:10:00Z"]);
}

#[test]
fn invalid_schedule_is_rejected() {
    let err = CronTicks::new("not a cron", None, at(0, 0, 0)).unwrap_err();
    assert!(matches!(err, crate::error::DiscoveryError::Schedule { .. }));
}
