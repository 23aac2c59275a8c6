//! Storage layer for the punch shift clock.
//!
//! Provides persistence for users, shifts, and breaks using `rusqlite`,
//! plus the transactional clock operations (clock-in, pause, resume,
//! clock-out) that enforce the per-user invariants.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Clock operations for one user race on "latest shift of status X", so
//! each mutation runs inside a single transaction: the guard query and
//! the write commit atomically, and two concurrent pauses cannot both
//! append an open break.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC format with millisecond
//! precision (e.g., `2025-03-10T09:00:00.000Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - One fixed offset everywhere; localisation happens only at display
//!
//! ## Deletion
//!
//! Shifts and breaks are append-only audit data. The only deletion path
//! is removing a user, which cascades through `ON DELETE CASCADE`.

use std::path::Path;

use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use thiserror::Error;
use uuid::Uuid;

use punch_core::shift::{Pause, Shift, TransitionError};
use punch_core::types::{PauseId, Role, ShiftId, ShiftStatus, UserId, ValidationError};
use punch_core::report::{ShiftRecord, WorkerShifts};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A clock action was not permitted in the current state.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// A stored identifier, status, or role failed validation.
    #[error("invalid stored value: {0}")]
    Validation(#[from] ValidationError),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {id}: {timestamp}")]
    TimestampParse {
        id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// The referenced user does not exist.
    #[error("unknown user: {0}")]
    UnknownUser(String),
    /// Year/month do not form a valid calendar month.
    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'worker'
            );

            -- Shifts: one row per clock-in
            -- start_time/end_time: RFC 3339 UTC (e.g., '2025-03-10T09:00:00.000Z')
            -- status: 'active' | 'paused' | 'ended'
            CREATE TABLE IF NOT EXISTS shifts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                status TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_shifts_user_status ON shifts(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_shifts_start ON shifts(start_time);

            -- Breaks: resume_time IS NULL means the break is still open
            CREATE TABLE IF NOT EXISTS pauses (
                id TEXT PRIMARY KEY,
                shift_id TEXT NOT NULL,
                pause_time TEXT NOT NULL,
                resume_time TEXT,
                FOREIGN KEY (shift_id) REFERENCES shifts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_pauses_shift ON pauses(shift_id, pause_time);
            ",
        )?;
        Ok(())
    }

    // ========== Users ==========

    /// Inserts or updates a user.
    pub fn upsert_user(&mut self, id: &UserId, name: &str, role: Role) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO users (id, name, role) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, role = excluded.role
            ",
            params![id.as_str(), name, role.as_str()],
        )?;
        Ok(())
    }

    /// Looks up a user by ID.
    pub fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, role FROM users WHERE id = ?",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, name, role)| {
            Ok(UserRecord {
                id: UserId::new(id)?,
                name,
                role: role.parse()?,
            })
        })
        .transpose()
    }

    /// Like [`get_user`](Self::get_user) but errors when the user is missing.
    pub fn require_user(&self, id: &UserId) -> Result<UserRecord, DbError> {
        self.get_user(id)?
            .ok_or_else(|| DbError::UnknownUser(id.to_string()))
    }

    /// Lists all users ordered by name then ID.
    pub fn list_users(&self) -> Result<Vec<UserRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, role FROM users ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut users = Vec::new();
        for row in rows {
            let (id, name, role) = row?;
            users.push(UserRecord {
                id: UserId::new(id)?,
                name,
                role: role.parse()?,
            });
        }
        Ok(users)
    }

    /// Lists users that have recorded at least one shift.
    pub fn workers_with_shifts(&self) -> Result<Vec<UserRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, role FROM users
            WHERE EXISTS (SELECT 1 FROM shifts WHERE shifts.user_id = users.id)
            ORDER BY name ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut users = Vec::new();
        for row in rows {
            let (id, name, role) = row?;
            users.push(UserRecord {
                id: UserId::new(id)?,
                name,
                role: role.parse()?,
            });
        }
        Ok(users)
    }

    /// Removes a user, cascading to their shifts and breaks.
    ///
    /// This is the only deletion path in the store. Returns `true` if
    /// the user existed.
    pub fn remove_user(&mut self, id: &UserId) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", params![id.as_str()])?;
        Ok(removed > 0)
    }

    // ========== Clock operations ==========

    /// Clocks a user in, creating a new active shift.
    ///
    /// Rejected with [`TransitionError::Conflict`] when the user already
    /// has an active or paused shift; a retried clock-in must fail, not
    /// silently succeed.
    pub fn clock_in(&mut self, user: &UserId) -> Result<Shift, DbError> {
        self.clock_in_at(user, Utc::now())
    }

    fn clock_in_at(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<Shift, DbError> {
        self.require_user(user)?;
        let tx = self.conn.transaction()?;
        if latest_by_status(&tx, user, &[ShiftStatus::Active, ShiftStatus::Paused])?.is_some() {
            return Err(TransitionError::Conflict { user: user.clone() }.into());
        }
        let shift = Shift::begin(new_shift_id(), user.clone(), now);
        tx.execute(
            "INSERT INTO shifts (id, user_id, start_time, end_time, status) VALUES (?, ?, ?, NULL, ?)",
            params![
                shift.id.as_str(),
                shift.user_id.as_str(),
                format_timestamp(shift.start_time),
                shift.status.as_str(),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(user = %user, shift = %shift.id, "clocked in");
        Ok(shift)
    }

    /// Starts a break on the user's latest active shift.
    pub fn pause_shift(&mut self, user: &UserId) -> Result<Pause, DbError> {
        self.pause_shift_at(user, Utc::now())
    }

    fn pause_shift_at(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<Pause, DbError> {
        let tx = self.conn.transaction()?;
        let mut shift = latest_by_status(&tx, user, &[ShiftStatus::Active])?.ok_or(
            TransitionError::InvalidState {
                user: user.clone(),
                expected: "active",
            },
        )?;
        let pause = shift.pause(new_pause_id(), now)?;
        tx.execute(
            "INSERT INTO pauses (id, shift_id, pause_time, resume_time) VALUES (?, ?, ?, NULL)",
            params![
                pause.id.as_str(),
                pause.shift_id.as_str(),
                format_timestamp(pause.pause_time),
            ],
        )?;
        tx.execute(
            "UPDATE shifts SET status = ? WHERE id = ?",
            params![shift.status.as_str(), shift.id.as_str()],
        )?;
        tx.commit()?;
        tracing::debug!(user = %user, shift = %shift.id, "break started");
        Ok(pause)
    }

    /// Ends the break on the user's latest paused shift.
    pub fn resume_shift(&mut self, user: &UserId) -> Result<Shift, DbError> {
        self.resume_shift_at(user, Utc::now())
    }

    fn resume_shift_at(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<Shift, DbError> {
        let tx = self.conn.transaction()?;
        let mut shift = latest_by_status(&tx, user, &[ShiftStatus::Paused])?.ok_or(
            TransitionError::InvalidState {
                user: user.clone(),
                expected: "paused",
            },
        )?;
        let mut open_pause =
            open_pause_for_shift(&tx, &shift.id)?.ok_or(TransitionError::InvalidState {
                user: user.clone(),
                expected: "paused",
            })?;
        shift.resume(&mut open_pause, now)?;
        tx.execute(
            "UPDATE pauses SET resume_time = ? WHERE id = ?",
            params![
                open_pause.resume_time.map(format_timestamp),
                open_pause.id.as_str(),
            ],
        )?;
        tx.execute(
            "UPDATE shifts SET status = ? WHERE id = ?",
            params![shift.status.as_str(), shift.id.as_str()],
        )?;
        tx.commit()?;
        tracing::debug!(user = %user, shift = %shift.id, "break ended");
        Ok(shift)
    }

    /// Clocks a user out, ending their latest active or paused shift.
    ///
    /// An open break is left open; the reconciler treats the stretch
    /// from break start to shift end as non-work.
    pub fn clock_out(&mut self, user: &UserId) -> Result<Shift, DbError> {
        self.clock_out_at(user, Utc::now())
    }

    fn clock_out_at(&mut self, user: &UserId, now: DateTime<Utc>) -> Result<Shift, DbError> {
        let tx = self.conn.transaction()?;
        let mut shift = latest_by_status(&tx, user, &[ShiftStatus::Active, ShiftStatus::Paused])?
            .ok_or(TransitionError::InvalidState {
                user: user.clone(),
                expected: "active or paused",
            })?;
        shift.close(now)?;
        tx.execute(
            "UPDATE shifts SET status = ?, end_time = ? WHERE id = ?",
            params![
                shift.status.as_str(),
                shift.end_time.map(format_timestamp),
                shift.id.as_str(),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(user = %user, shift = %shift.id, "clocked out");
        Ok(shift)
    }

    // ========== Queries ==========

    /// Returns the user's latest shift matching any of the given
    /// statuses, by clock-in time.
    pub fn find_latest_by_user_and_status(
        &self,
        user: &UserId,
        statuses: &[ShiftStatus],
    ) -> Result<Option<Shift>, DbError> {
        latest_by_status(&self.conn, user, statuses)
    }

    /// Returns the user's currently open shift with its breaks, if any.
    pub fn current_shift(&self, user: &UserId) -> Result<Option<ShiftRecord>, DbError> {
        let shift = latest_by_status(
            &self.conn,
            user,
            &[ShiftStatus::Active, ShiftStatus::Paused],
        )?;
        shift
            .map(|shift| {
                let pauses = pauses_for_shift(&self.conn, &shift.id)?;
                Ok(ShiftRecord { shift, pauses })
            })
            .transpose()
    }

    /// Lists all of a user's shifts with their breaks, clock-in ascending.
    pub fn shifts_for_user(&self, user: &UserId) -> Result<Vec<ShiftRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, user_id, start_time, end_time, status
            FROM shifts
            WHERE user_id = ?
            ORDER BY start_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![user.as_str()], shift_row)?;
        let mut records = Vec::new();
        for row in rows {
            let shift = shift_from_row(row?)?;
            let pauses = pauses_for_shift(&self.conn, &shift.id)?;
            records.push(ShiftRecord { shift, pauses });
        }
        Ok(records)
    }

    /// Lists a user's shifts whose clock-in falls within the given
    /// calendar month (UTC), with their breaks.
    pub fn shifts_for_month(
        &self,
        user: &UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<ShiftRecord>, DbError> {
        let (start, end) = month_bounds(year, month)?;
        let mut stmt = self.conn.prepare(
            "
            SELECT id, user_id, start_time, end_time, status
            FROM shifts
            WHERE user_id = ? AND start_time >= ? AND start_time < ?
            ORDER BY start_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![user.as_str(), format_timestamp(start), format_timestamp(end)],
            shift_row,
        )?;
        let mut records = Vec::new();
        for row in rows {
            let shift = shift_from_row(row?)?;
            let pauses = pauses_for_shift(&self.conn, &shift.id)?;
            records.push(ShiftRecord { shift, pauses });
        }
        Ok(records)
    }

    /// Loads every worker that has shifts, with all their shifts and
    /// breaks, as input for the admin-wide report.
    pub fn all_worker_shifts(&self) -> Result<Vec<WorkerShifts>, DbError> {
        let workers = self.workers_with_shifts()?;
        let mut result = Vec::with_capacity(workers.len());
        for worker in workers {
            let records = self.shifts_for_user(&worker.id)?;
            result.push(WorkerShifts {
                user_id: worker.id,
                name: worker.name,
                records,
            });
        }
        Ok(result)
    }

    /// Distinct years (UTC, descending) in which the user clocked in.
    pub fn available_years(&self, user: &UserId) -> Result<Vec<i32>, DbError> {
        // start_time is fixed-width RFC 3339, so the year is the first
        // four characters.
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT CAST(substr(start_time, 1, 4) AS INTEGER) AS year
            FROM shifts
            WHERE user_id = ?
            ORDER BY year DESC
            ",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| row.get::<_, i32>(0))?;
        let mut years = Vec::new();
        for row in rows {
            years.push(row?);
        }
        Ok(years)
    }

    /// Distinct months (UTC, descending) with shifts for a user in a year.
    pub fn available_months(&self, user: &UserId, year: i32) -> Result<Vec<u32>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT CAST(substr(start_time, 6, 2) AS INTEGER) AS month
            FROM shifts
            WHERE user_id = ? AND CAST(substr(start_time, 1, 4) AS INTEGER) = ?
            ORDER BY month DESC
            ",
        )?;
        let rows = stmt.query_map(params![user.as_str(), year], |row| row.get::<_, u32>(0))?;
        let mut months = Vec::new();
        for row in rows {
            months.push(row?);
        }
        Ok(months)
    }
}

/// Raw shift row before identifier/timestamp parsing.
type RawShiftRow = (String, String, String, Option<String>, String);

fn shift_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawShiftRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn shift_from_row(row: RawShiftRow) -> Result<Shift, DbError> {
    let (id, user_id, start_time, end_time, status) = row;
    let start_time = parse_timestamp(&id, &start_time)?;
    let end_time = end_time.map(|ts| parse_timestamp(&id, &ts)).transpose()?;
    Ok(Shift {
        id: ShiftId::new(id)?,
        user_id: UserId::new(user_id)?,
        start_time,
        end_time,
        status: status.parse()?,
    })
}

fn latest_by_status(
    conn: &Connection,
    user: &UserId,
    statuses: &[ShiftStatus],
) -> Result<Option<Shift>, DbError> {
    if statuses.is_empty() {
        return Ok(None);
    }
    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "
        SELECT id, user_id, start_time, end_time, status
        FROM shifts
        WHERE user_id = ? AND status IN ({placeholders})
        ORDER BY start_time DESC, id DESC
        LIMIT 1
        "
    );
    let mut stmt = conn.prepare(&sql)?;
    let params = std::iter::once(user.as_str().to_string())
        .chain(statuses.iter().map(|s| s.as_str().to_string()));
    let row = stmt
        .query_row(params_from_iter(params), shift_row)
        .optional()?;
    row.map(shift_from_row).transpose()
}

fn pauses_for_shift(conn: &Connection, shift_id: &ShiftId) -> Result<Vec<Pause>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, shift_id, pause_time, resume_time
        FROM pauses
        WHERE shift_id = ?
        ORDER BY pause_time ASC, id ASC
        ",
    )?;
    let rows = stmt.query_map(params![shift_id.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;
    let mut pauses = Vec::new();
    for row in rows {
        let (id, shift_id, pause_time, resume_time) = row?;
        let pause_time = parse_timestamp(&id, &pause_time)?;
        let resume_time = resume_time.map(|ts| parse_timestamp(&id, &ts)).transpose()?;
        pauses.push(Pause {
            id: PauseId::new(id)?,
            shift_id: ShiftId::new(shift_id)?,
            pause_time,
            resume_time,
        });
    }
    Ok(pauses)
}

/// Most recent open break for a shift, if any.
fn open_pause_for_shift(conn: &Connection, shift_id: &ShiftId) -> Result<Option<Pause>, DbError> {
    let row = conn
        .query_row(
            "
            SELECT id, shift_id, pause_time
            FROM pauses
            WHERE shift_id = ? AND resume_time IS NULL
            ORDER BY pause_time DESC, id DESC
            LIMIT 1
            ",
            params![shift_id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;
    row.map(|(id, shift_id, pause_time)| {
        let pause_time = parse_timestamp(&id, &pause_time)?;
        Ok(Pause {
            id: PauseId::new(id)?,
            shift_id: ShiftId::new(shift_id)?,
            pause_time,
            resume_time: None,
        })
    })
    .transpose()
}

fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), DbError> {
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or(DbError::InvalidMonth { year, month })?;
    let end = if month == 12 {
        Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
    } else {
        Utc.with_ymd_and_hms(year, month + 1, 1, 0, 0, 0)
    }
    .single()
    .ok_or(DbError::InvalidMonth { year, month })?;
    debug_assert!(start.year() == year);
    Ok((start, end))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(id: &str, timestamp: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn new_shift_id() -> ShiftId {
    // A freshly generated UUID is never empty, so this cannot fail.
    ShiftId::new(Uuid::new_v4().to_string()).unwrap_or_else(|_| unreachable!())
}

fn new_pause_id() -> PauseId {
    PauseId::new(Uuid::new_v4().to_string()).unwrap_or_else(|_| unreachable!())
}
