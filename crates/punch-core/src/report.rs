//! Reporting aggregation over reconciled shifts.
//!
//! Groups worked totals by worker, calendar day, and calendar month
//! for display. Grouping keys use the UTC date of the shift's
//! clock-in, so a shift spanning midnight belongs wholly to the day it
//! started on. Days are sorted newest first for display.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::reconcile::reconcile;
use crate::shift::{Pause, Shift};
use crate::types::{Role, ShiftId, UserId};

/// Raised when a non-admin requests an aggregate report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("admin role required, acting user has role {role}")]
pub struct AuthorizationError {
    pub role: Role,
}

/// Checks that the acting role may view aggregate reports.
pub const fn authorize_admin(role: Role) -> Result<(), AuthorizationError> {
    match role {
        Role::Admin => Ok(()),
        Role::Worker => Err(AuthorizationError { role }),
    }
}

/// A shift together with its breaks, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRecord {
    pub shift: Shift,
    /// Ordered by `pause_time` ascending.
    pub pauses: Vec<Pause>,
}

/// One shift's line in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftSummary {
    pub shift_id: ShiftId,
    pub start_time: DateTime<Utc>,
    /// `None` while the shift is still running.
    pub end_time: Option<DateTime<Utc>>,
    pub worked_seconds: i64,
}

/// All shifts of one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub total_seconds: i64,
    /// Ordered by clock-in ascending within the day.
    pub shifts: Vec<ShiftSummary>,
}

/// One worker's section of the admin-wide report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub user_id: UserId,
    pub name: String,
    pub total_seconds: i64,
    /// Ordered by date descending.
    pub days: Vec<DayReport>,
}

/// Per-worker monthly breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthReport {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    pub total_seconds: i64,
    /// Ordered by date descending.
    pub days: Vec<DayReport>,
}

/// A worker and their loaded shifts, input to [`admin_report`].
#[derive(Debug, Clone)]
pub struct WorkerShifts {
    pub user_id: UserId,
    pub name: String,
    pub records: Vec<ShiftRecord>,
}

/// Reconciles one record into a report line.
#[must_use]
pub fn summarize(record: &ShiftRecord, now: DateTime<Utc>) -> ShiftSummary {
    let reconciled = reconcile(&record.shift, &record.pauses, now);
    ShiftSummary {
        shift_id: record.shift.id.clone(),
        start_time: record.shift.start_time,
        end_time: record.shift.effective_end(),
        worked_seconds: reconciled.total_seconds(),
    }
}

/// Groups records by the UTC date of clock-in, newest day first.
#[must_use]
pub fn group_by_day(records: &[ShiftRecord], now: DateTime<Utc>) -> Vec<DayReport> {
    let mut by_day: BTreeMap<NaiveDate, Vec<ShiftSummary>> = BTreeMap::new();
    for record in records {
        let date = record.shift.start_time.date_naive();
        by_day.entry(date).or_default().push(summarize(record, now));
    }

    let mut days: Vec<DayReport> = by_day
        .into_iter()
        .map(|(date, mut shifts)| {
            shifts.sort_by_key(|s| s.start_time);
            let total_seconds = shifts.iter().map(|s| s.worked_seconds).sum();
            DayReport { date, total_seconds, shifts }
        })
        .collect();
    days.reverse();
    days
}

/// Builds the admin-wide report: every worker, grouped by day.
///
/// Workers are sorted by name (then ID) and reconciled in parallel;
/// each worker's shifts are independent so the fan-out is pure.
#[must_use]
pub fn admin_report(workers: &[WorkerShifts], now: DateTime<Utc>) -> Vec<WorkerReport> {
    let mut report: Vec<WorkerReport> = workers
        .par_iter()
        .map(|worker| {
            let days = group_by_day(&worker.records, now);
            let total_seconds = days.iter().map(|d| d.total_seconds).sum();
            WorkerReport {
                user_id: worker.user_id.clone(),
                name: worker.name.clone(),
                total_seconds,
                days,
            }
        })
        .collect();
    report.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.user_id.as_str().cmp(b.user_id.as_str())));
    report
}

/// Builds one worker's monthly breakdown.
///
/// Records whose clock-in falls outside `(year, month)` are filtered
/// out, so callers may pass an unfiltered load.
#[must_use]
pub fn month_report(
    user_id: UserId,
    year: i32,
    month: u32,
    records: &[ShiftRecord],
    now: DateTime<Utc>,
) -> MonthReport {
    let in_month: Vec<ShiftRecord> = records
        .iter()
        .filter(|r| {
            let date = r.shift.start_time.date_naive();
            date.year() == year && date.month() == month
        })
        .cloned()
        .collect();
    let days = group_by_day(&in_month, now);
    let total_seconds = days.iter().map(|d| d.total_seconds).sum();
    MonthReport { user_id, year, month, total_seconds, days }
}

/// Splits a second count into (hours, minutes, seconds).
///
/// Negative inputs clamp to zero.
#[must_use]
pub const fn split_duration(total_seconds: i64) -> (i64, i64, i64) {
    if total_seconds <= 0 {
        return (0, 0, 0);
    }
    (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
}

/// Formats a second count as `"Hh MMm SSs"`.
#[must_use]
pub fn format_duration(total_seconds: i64) -> String {
    let (hours, minutes, seconds) = split_duration(total_seconds);
    format!("{hours}h {minutes:02}m {seconds:02}s")
}
