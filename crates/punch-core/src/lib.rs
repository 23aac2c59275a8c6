//! Core domain logic for the punch shift clock.
//!
//! This crate contains the fundamental types and logic for:
//! - Shifts: the clock-in/pause/resume/clock-out state machine
//! - Reconciliation: computing actual worked time from a shift and its breaks
//! - Reporting: grouping reconciled totals by worker, day, and month

pub mod reconcile;
pub mod report;
pub mod shift;
pub mod types;

pub use reconcile::{Reconciliation, WorkedInterval, reconcile};
pub use report::{
    AuthorizationError, DayReport, MonthReport, ShiftRecord, ShiftSummary, WorkerReport,
    WorkerShifts, authorize_admin,
};
pub use shift::{Pause, Shift, TransitionError};
pub use types::{PauseId, Role, ShiftId, ShiftStatus, UserId, ValidationError};
