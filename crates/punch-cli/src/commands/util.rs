//! Shared rendering helpers for report-style commands.

use std::io::Write;

use anyhow::Result;

use punch_core::report::{DayReport, ShiftSummary, format_duration};

/// Renders one shift line: `09:00 - 17:00 (7h 30m 00s)`.
///
/// Open shifts render as `09:00 - ongoing (...)`.
pub fn write_shift<W: Write>(writer: &mut W, shift: &ShiftSummary, indent: &str) -> Result<()> {
    let end = shift
        .end_time
        .map_or_else(|| "ongoing".to_string(), |t| t.format("%H:%M").to_string());
    writeln!(
        writer,
        "{indent}{} - {end} ({})",
        shift.start_time.format("%H:%M"),
        format_duration(shift.worked_seconds)
    )?;
    Ok(())
}

/// Renders a day header and its shifts.
pub fn write_day<W: Write>(writer: &mut W, day: &DayReport, indent: &str) -> Result<()> {
    writeln!(
        writer,
        "{indent}{} ({})",
        day.date,
        format_duration(day.total_seconds)
    )?;
    for shift in &day.shifts {
        write_shift(writer, shift, &format!("{indent}  "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use punch_core::ShiftId;

    #[test]
    fn shift_line_renders_times_and_duration() {
        let summary = ShiftSummary {
            shift_id: ShiftId::new("s1").unwrap(),
            start_time: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            end_time: Some(Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap()),
            worked_seconds: 8 * 3600,
        };
        let mut output = Vec::new();
        write_shift(&mut output, &summary, "  ").unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "  09:00 - 17:00 (8h 00m 00s)\n"
        );
    }

    #[test]
    fn open_shift_renders_ongoing() {
        let summary = ShiftSummary {
            shift_id: ShiftId::new("s1").unwrap(),
            start_time: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            end_time: None,
            worked_seconds: 600,
        };
        let mut output = Vec::new();
        write_shift(&mut output, &summary, "").unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "09:00 - ongoing (0h 10m 00s)\n"
        );
    }
}
