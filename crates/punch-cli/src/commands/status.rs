//! Status command: the current shift and worked-so-far.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use punch_core::report::format_duration;
use punch_core::{ShiftStatus, UserId, reconcile};
use punch_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, user: &str) -> Result<()> {
    run_at(writer, db, user, Utc::now())
}

fn run_at<W: Write>(writer: &mut W, db: &Database, user: &str, now: DateTime<Utc>) -> Result<()> {
    let user = UserId::new(user).with_context(|| format!("invalid user ID: {user:?}"))?;
    let record = db.require_user(&user)?;

    let Some(current) = db.current_shift(&user)? else {
        writeln!(writer, "{}: not clocked in.", record.name)?;
        return Ok(());
    };

    let reconciled = reconcile(&current.shift, &current.pauses, now);
    let state = match current.shift.status {
        ShiftStatus::Active => "working",
        ShiftStatus::Paused => "on break",
        ShiftStatus::Ended => "ended",
    };

    writeln!(writer, "{}: {state}", record.name)?;
    writeln!(
        writer,
        "Clocked in at {}",
        current.shift.start_time.format("%Y-%m-%d %H:%M")
    )?;
    if !current.pauses.is_empty() {
        writeln!(writer, "Breaks taken: {}", current.pauses.len())?;
    }
    writeln!(
        writer,
        "Worked so far: {}",
        format_duration(reconciled.total_seconds())
    )?;
    Ok(())
}
