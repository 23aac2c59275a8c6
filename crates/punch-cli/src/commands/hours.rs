//! Hours command: a worker's own shifts grouped by day.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use punch_core::UserId;
use punch_core::report::group_by_day;
use punch_db::Database;

use super::util::write_day;

pub fn run<W: Write>(writer: &mut W, db: &Database, user: &str, json: bool) -> Result<()> {
    run_at(writer, db, user, json, Utc::now())
}

fn run_at<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &str,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let user = UserId::new(user).with_context(|| format!("invalid user ID: {user:?}"))?;
    let record = db.require_user(&user)?;
    let shifts = db.shifts_for_user(&user)?;
    let days = group_by_day(&shifts, now);

    if json {
        serde_json::to_writer_pretty(&mut *writer, &days)?;
        writeln!(writer)?;
        return Ok(());
    }

    if days.is_empty() {
        writeln!(writer, "{}: no shifts recorded.", record.name)?;
        return Ok(());
    }

    writeln!(writer, "Hours for {}:", record.name)?;
    for day in &days {
        write_day(writer, day, "")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use punch_core::Role;

    #[test]
    fn empty_history_prints_notice() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_user(&UserId::new("w1").unwrap(), "Ada", Role::Worker)
            .unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, "w1", false).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Ada: no shifts recorded.\n"
        );
    }

    #[test]
    fn days_render_newest_first() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("w1").unwrap();
        db.upsert_user(&user, "Ada", Role::Worker).unwrap();
        db.clock_in(&user).unwrap();
        db.clock_out(&user).unwrap();

        let mut output = Vec::new();
        let now = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        run_at(&mut output, &db, "w1", false, now).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("Hours for Ada:\n"));
        assert!(text.contains("0h 00m"));
    }

    #[test]
    fn json_output_is_a_day_array() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::new("w1").unwrap();
        db.upsert_user(&user, "Ada", Role::Worker).unwrap();
        db.clock_in(&user).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, "w1", true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let days = value.as_array().unwrap();
        assert_eq!(days.len(), 1);
        assert!(days[0].get("date").is_some());
        assert_eq!(days[0]["shifts"].as_array().unwrap().len(), 1);
        assert!(days[0]["shifts"][0]["end_time"].is_null());
    }
}
