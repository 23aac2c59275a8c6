//! Clock commands: in, pause, resume, out.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;

use punch_core::report::format_duration;
use punch_core::{UserId, reconcile};
use punch_db::Database;

fn parse_user(user: &str) -> Result<UserId> {
    UserId::new(user).with_context(|| format!("invalid user ID: {user:?}"))
}

/// Clocks a user in.
pub fn clock_in<W: Write>(writer: &mut W, db: &mut Database, user: &str) -> Result<()> {
    let user = parse_user(user)?;
    let shift = db.clock_in(&user)?;
    tracing::info!(user = %user, shift = %shift.id, "shift started");
    writeln!(
        writer,
        "Shift started at {}.",
        shift.start_time.format("%Y-%m-%d %H:%M")
    )?;
    Ok(())
}

/// Starts a break.
pub fn pause<W: Write>(writer: &mut W, db: &mut Database, user: &str) -> Result<()> {
    let user = parse_user(user)?;
    let break_record = db.pause_shift(&user)?;
    tracing::info!(user = %user, pause = %break_record.id, "break started");
    writeln!(
        writer,
        "Break started at {}.",
        break_record.pause_time.format("%H:%M")
    )?;
    Ok(())
}

/// Ends a break.
pub fn resume<W: Write>(writer: &mut W, db: &mut Database, user: &str) -> Result<()> {
    let user = parse_user(user)?;
    let shift = db.resume_shift(&user)?;
    tracing::info!(user = %user, shift = %shift.id, "break ended");
    writeln!(writer, "Break over, back to work.")?;
    Ok(())
}

/// Clocks a user out and reports the shift's worked total.
pub fn clock_out<W: Write>(writer: &mut W, db: &mut Database, user: &str) -> Result<()> {
    let user = parse_user(user)?;
    let shift = db.clock_out(&user)?;
    tracing::info!(user = %user, shift = %shift.id, "shift ended");

    let records = db.shifts_for_user(&user)?;
    let worked = records
        .iter()
        .find(|r| r.shift.id == shift.id)
        .map_or(0, |r| reconcile(&r.shift, &r.pauses, Utc::now()).total_seconds());

    writeln!(
        writer,
        "Shift ended at {}. Worked {}.",
        shift
            .end_time
            .map_or_else(String::new, |t| t.format("%H:%M").to_string()),
        format_duration(worked)
    )?;
    Ok(())
}
