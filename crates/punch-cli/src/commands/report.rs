//! Admin report commands: all-workers overview and per-worker monthly
//! breakdown.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use punch_core::UserId;
use punch_core::report::{admin_report, authorize_admin, format_duration, month_report};
use punch_db::Database;

use super::util::write_day;

/// Parses the acting user and checks they hold the admin role.
fn authorize(db: &Database, acting: &str) -> Result<()> {
    let acting = UserId::new(acting).with_context(|| format!("invalid user ID: {acting:?}"))?;
    let record = db.require_user(&acting)?;
    authorize_admin(record.role)?;
    Ok(())
}

/// Runs the admin-wide report: every worker, grouped by day.
pub fn run<W: Write>(writer: &mut W, db: &Database, acting: &str, json: bool) -> Result<()> {
    run_at(writer, db, acting, json, Utc::now())
}

fn run_at<W: Write>(
    writer: &mut W,
    db: &Database,
    acting: &str,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    authorize(db, acting)?;
    let workers = db.all_worker_shifts()?;
    let report = admin_report(&workers, now);

    if json {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    if report.is_empty() {
        writeln!(writer, "No shifts recorded.")?;
        return Ok(());
    }

    for worker in &report {
        writeln!(
            writer,
            "{} ({}): {}",
            worker.name,
            worker.user_id,
            format_duration(worker.total_seconds)
        )?;
        for day in &worker.days {
            write_day(writer, day, "  ")?;
        }
    }
    Ok(())
}

/// Runs the monthly report for one worker.
///
/// Without a year, lists available years; with a year but no month,
/// lists available months for that year.
pub fn month<W: Write>(
    writer: &mut W,
    db: &Database,
    acting: &str,
    user: &str,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
) -> Result<()> {
    month_at(writer, db, acting, user, year, month, json, Utc::now())
}

#[expect(clippy::too_many_arguments, reason = "thin dispatch over CLI flags")]
fn month_at<W: Write>(
    writer: &mut W,
    db: &Database,
    acting: &str,
    user: &str,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    authorize(db, acting)?;
    let user = UserId::new(user).with_context(|| format!("invalid user ID: {user:?}"))?;
    let record = db.require_user(&user)?;

    let (year, month) = match (year, month) {
        (Some(year), Some(month)) => (year, month),
        (Some(year), None) => {
            let months = db.available_months(&user, year)?;
            if months.is_empty() {
                writeln!(writer, "{}: no shifts in {year}.", record.name)?;
            } else {
                let list: Vec<String> = months.iter().map(|m| format!("{m:02}")).collect();
                writeln!(writer, "Months with shifts in {year}: {}", list.join(", "))?;
            }
            return Ok(());
        }
        (None, _) => {
            let years = db.available_years(&user)?;
            if years.is_empty() {
                writeln!(writer, "{}: no shifts recorded.", record.name)?;
            } else {
                let list: Vec<String> = years.iter().map(i32::to_string).collect();
                writeln!(writer, "Years with shifts: {}", list.join(", "))?;
            }
            return Ok(());
        }
    };

    let shifts = db.shifts_for_month(&user, year, month)?;
    let report = month_report(user, year, month, &shifts, now);

    if json {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    if report.days.is_empty() {
        writeln!(writer, "{}: no shifts in {year}-{month:02}.", record.name)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} in {year}-{month:02}: {}",
        record.name,
        format_duration(report.total_seconds)
    )?;
    for day in &report.days {
        write_day(writer, day, "  ")?;
    }
    Ok(())
}
