//! Work shift state machine.
//!
//! A [`Shift`] is one continuous stretch of work from clock-in to
//! clock-out. Breaks within a shift are recorded as [`Pause`] rows; a
//! pause with no resume timestamp is still running ("open").
//!
//! Transitions are monotonic: nothing is ever deleted or rewound, each
//! action only appends or fills in a timestamp. Clocking out does not
//! close an open pause; the reconciler treats pause-to-end as break
//! time (see [`crate::reconcile`]).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PauseId, ShiftId, ShiftStatus, UserId};

/// Errors raised when a clock action is not permitted in the current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The user already has an open shift; clocking in again is rejected.
    #[error("user {user} already has an open shift")]
    Conflict { user: UserId },

    /// The action needs a shift in a state that does not exist for the user.
    #[error("no {expected} shift found for user {user}")]
    InvalidState { user: UserId, expected: &'static str },
}

/// A break interval within a shift.
///
/// `resume_time = None` means the break is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pause {
    pub id: PauseId,
    pub shift_id: ShiftId,
    pub pause_time: DateTime<Utc>,
    pub resume_time: Option<DateTime<Utc>>,
}

impl Pause {
    /// Length of the break, or zero while it is still running.
    ///
    /// Callers that need "paused so far" for a live shift must go
    /// through the reconciler; this accessor deliberately reports only
    /// closed breaks.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.resume_time
            .map_or_else(Duration::zero, |resume| resume - self.pause_time)
    }

    /// Whether the break has no resume timestamp yet.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.resume_time.is_none()
    }
}

/// One work shift from clock-in to clock-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub user_id: UserId,
    /// Set at clock-in, immutable afterwards.
    pub start_time: DateTime<Utc>,
    /// Present only once the shift has ended.
    pub end_time: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
}

impl Shift {
    /// Creates a new active shift starting at `now` (clock-in).
    ///
    /// The one-open-shift-per-user rule is a cross-shift invariant and
    /// is enforced by the storage layer before calling this.
    #[must_use]
    pub const fn begin(id: ShiftId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            start_time: now,
            end_time: None,
            status: ShiftStatus::Active,
        }
    }

    /// Starts a break: active → paused, returning the new open [`Pause`].
    pub fn pause(&mut self, pause_id: PauseId, now: DateTime<Utc>) -> Result<Pause, TransitionError> {
        if self.status != ShiftStatus::Active {
            return Err(TransitionError::InvalidState {
                user: self.user_id.clone(),
                expected: "active",
            });
        }
        self.status = ShiftStatus::Paused;
        Ok(Pause {
            id: pause_id,
            shift_id: self.id.clone(),
            pause_time: now,
            resume_time: None,
        })
    }

    /// Ends a break: paused → active, closing the given open pause.
    pub fn resume(&mut self, open_pause: &mut Pause, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != ShiftStatus::Paused || !open_pause.is_open() {
            return Err(TransitionError::InvalidState {
                user: self.user_id.clone(),
                expected: "paused",
            });
        }
        open_pause.resume_time = Some(now);
        self.status = ShiftStatus::Active;
        Ok(())
    }

    /// Ends the shift: active or paused → ended (clock-out).
    ///
    /// An open pause stays open; it is not back-filled with the end
    /// timestamp.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.status.is_open() {
            return Err(TransitionError::InvalidState {
                user: self.user_id.clone(),
                expected: "active or paused",
            });
        }
        self.end_time = Some(now);
        self.status = ShiftStatus::Ended;
        Ok(())
    }

    /// Whether the shift is still running (active or paused).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// End time when ended, `None` while the shift is still running.
    #[must_use]
    pub const fn effective_end(&self) -> Option<DateTime<Utc>> {
        match self.status {
            ShiftStatus::Ended => self.end_time,
            ShiftStatus::Active | ShiftStatus::Paused => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn shift() -> Shift {
        Shift::begin(
            ShiftId::new("shift-1").unwrap(),
            UserId::new("worker-1").unwrap(),
            at(9, 0),
        )
    }

    #[test]
    fn begin_creates_active_shift() {
        let s = shift();
        assert_eq!(s.status, ShiftStatus::Active);
        assert_eq!(s.start_time, at(9, 0));
        assert!(s.end_time.is_none());
        assert!(s.is_open());
    }

    #[test]
    fn pause_moves_to_paused_and_opens_break() {
        let mut s = shift();
        let p = s.pause(PauseId::new("pause-1").unwrap(), at(12, 0)).unwrap();
        assert_eq!(s.status, ShiftStatus::Paused);
        assert_eq!(p.pause_time, at(12, 0));
        assert!(p.is_open());
        assert_eq!(p.shift_id, s.id);
    }

    #[test]
    fn pause_rejected_unless_active() {
        let mut s = shift();
        s.pause(PauseId::new("pause-1").unwrap(), at(12, 0)).unwrap();
        let err = s
            .pause(PauseId::new("pause-2").unwrap(), at(12, 5))
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { expected: "active", .. }));
    }

    #[test]
    fn resume_closes_open_break() {
        let mut s = shift();
        let mut p = s.pause(PauseId::new("pause-1").unwrap(), at(12, 0)).unwrap();
        s.resume(&mut p, at(12, 30)).unwrap();
        assert_eq!(s.status, ShiftStatus::Active);
        assert_eq!(p.resume_time, Some(at(12, 30)));
        assert_eq!(p.duration(), Duration::minutes(30));
    }

    #[test]
    fn resume_rejected_when_not_paused() {
        let mut s = shift();
        let mut stray = Pause {
            id: PauseId::new("pause-x").unwrap(),
            shift_id: s.id.clone(),
            pause_time: at(12, 0),
            resume_time: None,
        };
        let err = s.resume(&mut stray, at(12, 30)).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { expected: "paused", .. }));
    }

    #[test]
    fn resume_rejected_on_already_closed_pause() {
        let mut s = shift();
        let mut p = s.pause(PauseId::new("pause-1").unwrap(), at(12, 0)).unwrap();
        s.resume(&mut p, at(12, 30)).unwrap();
        s.pause(PauseId::new("pause-2").unwrap(), at(14, 0)).unwrap();
        // Session is paused again but this pause is already closed.
        let err = s.resume(&mut p, at(14, 30)).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { .. }));
        assert_eq!(p.resume_time, Some(at(12, 30)));
    }

    #[test]
    fn close_from_active() {
        let mut s = shift();
        s.close(at(17, 0)).unwrap();
        assert_eq!(s.status, ShiftStatus::Ended);
        assert_eq!(s.end_time, Some(at(17, 0)));
        assert_eq!(s.effective_end(), Some(at(17, 0)));
    }

    #[test]
    fn close_from_paused_leaves_break_open() {
        let mut s = shift();
        let p = s.pause(PauseId::new("pause-1").unwrap(), at(12, 0)).unwrap();
        s.close(at(17, 0)).unwrap();
        assert_eq!(s.status, ShiftStatus::Ended);
        assert!(p.is_open());
    }

    #[test]
    fn close_rejected_when_already_ended() {
        let mut s = shift();
        s.close(at(17, 0)).unwrap();
        let err = s.close(at(18, 0)).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidState { expected: "active or paused", .. }
        ));
        // First end time is untouched.
        assert_eq!(s.end_time, Some(at(17, 0)));
    }

    #[test]
    fn effective_end_is_none_while_open() {
        let mut s = shift();
        assert_eq!(s.effective_end(), None);
        s.pause(PauseId::new("pause-1").unwrap(), at(12, 0)).unwrap();
        assert_eq!(s.effective_end(), None);
    }

    #[test]
    fn open_pause_duration_is_zero() {
        let p = Pause {
            id: PauseId::new("pause-1").unwrap(),
            shift_id: ShiftId::new("shift-1").unwrap(),
            pause_time: at(12, 0),
            resume_time: None,
        };
        assert_eq!(p.duration(), Duration::zero());
    }
}
