//! Worked-time reconciliation.
//!
//! Computes how much of a shift was actually worked by sweeping a
//! cursor from clock-in across the ordered breaks, emitting the worked
//! sub-intervals between them.
//!
//! # Policy
//!
//! - A closed break is subtracted in full.
//! - A break never resumed on an ended shift consumes everything from
//!   its start to the shift end: the worker left for a break and never
//!   came back.
//! - A break still running on a live shift freezes the total at the
//!   break start; a later `now` does not grow it until the worker
//!   resumes.
//! - Breaks whose start is at or before the cursor (malformed ordering
//!   in stored data) are skipped rather than raised as errors, so
//!   reporting never fails on bad rows.
//!
//! The function is pure and idempotent: same shift, breaks, and `now`
//! always produce the same output, and for a live shift a later `now`
//! only extends the final interval.

use chrono::{DateTime, Duration, Utc};

use crate::shift::{Pause, Shift};

/// A half-open `[start, end)` stretch of actual work within a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorkedInterval {
    /// Length of the interval.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Result of reconciling one shift against its breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Disjoint worked intervals, in chronological order.
    pub intervals: Vec<WorkedInterval>,
    /// Sum of the interval lengths. Never negative.
    pub total: Duration,
}

impl Reconciliation {
    /// Total worked time in whole seconds.
    #[must_use]
    pub fn total_seconds(&self) -> i64 {
        self.total.num_seconds()
    }
}

/// Reconciles a shift and its breaks into worked intervals and a total.
///
/// `pauses` must be ordered by `pause_time` ascending (the storage
/// layer returns them that way). `now` is the reference instant used to
/// close the trailing interval of a live shift; it is ignored for ended
/// shifts.
#[must_use]
pub fn reconcile(shift: &Shift, pauses: &[Pause], now: DateTime<Utc>) -> Reconciliation {
    let mut cursor = shift.start_time;
    let effective_end = shift.effective_end();
    let mut intervals = Vec::new();

    for pause in pauses {
        // Where the break stops blocking work: resume if recorded,
        // shift end if the worker never came back, or zero-width while
        // both the shift and the break are still running.
        let pause_end = pause
            .resume_time
            .or(effective_end)
            .unwrap_or(pause.pause_time);

        if pause.pause_time > cursor {
            intervals.push(WorkedInterval {
                start: cursor,
                end: pause.pause_time,
            });
        } else {
            tracing::trace!(
                pause_id = %pause.id,
                shift_id = %shift.id,
                "break starts at or before cursor, skipping"
            );
        }
        cursor = pause_end;
    }

    match effective_end {
        Some(end) if end > cursor => intervals.push(WorkedInterval { start: cursor, end }),
        Some(_) => {}
        None if now > cursor => intervals.push(WorkedInterval { start: cursor, end: now }),
        None => {}
    }

    let total = intervals
        .iter()
        .fold(Duration::zero(), |acc, i| acc + i.duration());
    Reconciliation { intervals, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::types::{PauseId, ShiftId, ShiftStatus, UserId};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn shift(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Shift {
        Shift {
            id: ShiftId::new("shift-1").unwrap(),
            user_id: UserId::new("worker-1").unwrap(),
            start_time: start,
            end_time: end,
            status: if end.is_some() {
                ShiftStatus::Ended
            } else {
                ShiftStatus::Active
            },
        }
    }

    fn pause(n: u32, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Pause {
        Pause {
            id: PauseId::new(format!("pause-{n}")).unwrap(),
            shift_id: ShiftId::new("shift-1").unwrap(),
            pause_time: start,
            resume_time: end,
        }
    }

    #[test]
    fn ended_shift_without_breaks_is_full_span() {
        // 09:00 to 17:00, no breaks: 8h flat.
        let s = shift(at(9, 0), Some(at(17, 0)));
        let r = reconcile(&s, &[], at(23, 0));
        assert_eq!(r.total, Duration::hours(8));
        assert_eq!(
            r.intervals,
            vec![WorkedInterval { start: at(9, 0), end: at(17, 0) }]
        );
    }

    #[test]
    fn closed_break_is_subtracted() {
        // 09:00-17:00 with a 12:00-12:30 lunch: 7h30m in two pieces.
        let s = shift(at(9, 0), Some(at(17, 0)));
        let breaks = [pause(1, at(12, 0), Some(at(12, 30)))];
        let r = reconcile(&s, &breaks, at(23, 0));
        assert_eq!(r.total, Duration::minutes(7 * 60 + 30));
        assert_eq!(
            r.intervals,
            vec![
                WorkedInterval { start: at(9, 0), end: at(12, 0) },
                WorkedInterval { start: at(12, 30), end: at(17, 0) },
            ]
        );
    }

    #[test]
    fn unresumed_break_on_ended_shift_eats_the_tail() {
        // Paused at 12:00, never resumed, clocked out at 17:00: only
        // the morning counts.
        let s = shift(at(9, 0), Some(at(17, 0)));
        let breaks = [pause(1, at(12, 0), None)];
        let r = reconcile(&s, &breaks, at(23, 0));
        assert_eq!(r.total, Duration::hours(3));
        assert_eq!(
            r.intervals,
            vec![WorkedInterval { start: at(9, 0), end: at(12, 0) }]
        );
    }

    #[test]
    fn live_shift_counts_up_to_now() {
        // Started 09:00, break 12:00-12:20, now 13:00: 3h40m.
        let s = shift(at(9, 0), None);
        let breaks = [pause(1, at(12, 0), Some(at(12, 20)))];
        let r = reconcile(&s, &breaks, at(13, 0));
        assert_eq!(r.total, Duration::minutes(3 * 60 + 40));
        assert_eq!(
            r.intervals,
            vec![
                WorkedInterval { start: at(9, 0), end: at(12, 0) },
                WorkedInterval { start: at(12, 20), end: at(13, 0) },
            ]
        );
    }

    #[test]
    fn live_shift_without_breaks_counts_from_start_to_now() {
        let s = shift(at(9, 0), None);
        let r = reconcile(&s, &[], at(11, 15));
        assert_eq!(r.total, Duration::minutes(2 * 60 + 15));
    }

    #[test]
    fn live_shift_with_running_break_freezes_at_break_start() {
        // Paused at 12:00 and still on break: the total stays 3h no
        // matter how far `now` advances.
        let s = shift(at(9, 0), None);
        let breaks = [pause(1, at(12, 0), None)];
        for now_hour in [12, 14, 16] {
            let r = reconcile(&s, &breaks, at(now_hour, 0));
            assert_eq!(r.total, Duration::hours(3), "now={now_hour}:00");
            assert_eq!(
                r.intervals,
                vec![WorkedInterval { start: at(9, 0), end: at(12, 0) }]
            );
        }
    }

    #[test]
    fn multiple_breaks_produce_multiple_intervals() {
        let s = shift(at(9, 0), Some(at(18, 0)));
        let breaks = [
            pause(1, at(11, 0), Some(at(11, 15))),
            pause(2, at(13, 0), Some(at(14, 0))),
            pause(3, at(16, 30), Some(at(16, 45))),
        ];
        let r = reconcile(&s, &breaks, at(23, 0));
        assert_eq!(r.intervals.len(), 4);
        assert_eq!(r.total, Duration::minutes(9 * 60 - 90));
    }

    #[test]
    fn break_at_clock_in_emits_no_leading_interval() {
        // pause_time == start_time: the guard skips the zero-width lead.
        let s = shift(at(9, 0), Some(at(17, 0)));
        let breaks = [pause(1, at(9, 0), Some(at(9, 30)))];
        let r = reconcile(&s, &breaks, at(23, 0));
        assert_eq!(
            r.intervals,
            vec![WorkedInterval { start: at(9, 30), end: at(17, 0) }]
        );
        assert_eq!(r.total, Duration::minutes(7 * 60 + 30));
    }

    #[test]
    fn out_of_order_break_is_skipped_not_an_error() {
        // Second break starts before the cursor left by the first;
        // malformed rows must not break reporting.
        let s = shift(at(9, 0), Some(at(17, 0)));
        let breaks = [
            pause(1, at(12, 0), Some(at(13, 0))),
            pause(2, at(12, 30), Some(at(12, 45))),
        ];
        let r = reconcile(&s, &breaks, at(23, 0));
        // First break handled normally; the overlapping one emits no
        // interval but still moves the cursor to its resume time.
        assert_eq!(
            r.intervals,
            vec![
                WorkedInterval { start: at(9, 0), end: at(12, 0) },
                WorkedInterval { start: at(12, 45), end: at(17, 0) },
            ]
        );
    }

    #[test]
    fn now_before_start_yields_zero_for_live_shift() {
        let s = shift(at(9, 0), None);
        let r = reconcile(&s, &[], at(8, 0));
        assert!(r.intervals.is_empty());
        assert_eq!(r.total, Duration::zero());
    }

    #[test]
    fn zero_length_ended_shift_yields_zero() {
        let s = shift(at(9, 0), Some(at(9, 0)));
        let r = reconcile(&s, &[], at(23, 0));
        assert!(r.intervals.is_empty());
        assert_eq!(r.total, Duration::zero());
    }

    #[test]
    fn idempotent_for_identical_inputs() {
        let s = shift(at(9, 0), None);
        let breaks = [pause(1, at(10, 0), Some(at(10, 30)))];
        let first = reconcile(&s, &breaks, at(13, 0));
        let second = reconcile(&s, &breaks, at(13, 0));
        assert_eq!(first, second);
    }

    #[test]
    fn monotonic_in_now_for_live_shifts() {
        let s = shift(at(9, 0), None);
        let breaks = [pause(1, at(10, 0), Some(at(10, 30)))];
        let mut previous = Duration::zero();
        for minute in (0..600).step_by(7) {
            let now = at(9, 0) + Duration::minutes(minute);
            let total = reconcile(&s, &breaks, now).total;
            assert!(total >= previous, "total decreased at minute {minute}");
            previous = total;
        }
    }

    #[test]
    fn intervals_are_disjoint_and_cover_span_with_breaks() {
        // Worked intervals plus closed breaks tile the whole shift.
        let s = shift(at(9, 0), Some(at(17, 0)));
        let breaks = [
            pause(1, at(10, 0), Some(at(10, 15))),
            pause(2, at(12, 0), Some(at(12, 45))),
        ];
        let r = reconcile(&s, &breaks, at(23, 0));

        for pair in r.intervals.windows(2) {
            assert!(pair[0].end <= pair[1].start, "intervals overlap");
        }
        let worked: Duration = r
            .intervals
            .iter()
            .fold(Duration::zero(), |acc, i| acc + i.duration());
        let paused: Duration = breaks
            .iter()
            .fold(Duration::zero(), |acc, p| acc + p.duration());
        assert_eq!(worked + paused, at(17, 0) - at(9, 0));
    }

    #[test]
    fn ignores_now_for_ended_shifts() {
        let s = shift(at(9, 0), Some(at(17, 0)));
        let early = reconcile(&s, &[], at(12, 0));
        let late = reconcile(&s, &[], at(23, 0));
        assert_eq!(early, late);
    }
}
