//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid shift status value.
    #[error("invalid shift status: {value}")]
    InvalidStatus { value: String },

    /// Invalid role value.
    #[error("invalid role: {value}")]
    InvalidRole { value: String },
}

/// Lifecycle state of a work shift.
///
/// A shift starts `active`, toggles between `active` and `paused` while
/// the worker takes breaks, and terminates at `ended`. There is no
/// transition out of `ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    /// The worker is clocked in and working.
    #[default]
    Active,
    /// The worker is clocked in but on a break.
    Paused,
    /// The shift is over (terminal).
    Ended,
}

impl ShiftStatus {
    /// Returns the string representation for SQL storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    /// Whether the shift can still be mutated (not yet ended).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "ended" => Ok(Self::Ended),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Authorization role attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May view aggregate reports across all workers.
    Admin,
    /// May only act on and view their own shifts.
    #[default]
    Worker,
}

impl Role {
    /// Returns the string representation for SQL storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "worker" => Ok(Self::Worker),
            _ => Err(ValidationError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated user identifier.
    ///
    /// User IDs must be non-empty strings. They are supplied by the
    /// caller (chat handle, badge number, login) and must be stable:
    /// every shift a worker records hangs off this ID.
    UserId, "user ID"
);

define_string_id!(
    /// A validated shift identifier.
    ///
    /// Shift IDs must be non-empty strings. They are generated as UUIDs
    /// at clock-in; uniqueness is enforced at the database level.
    ShiftId, "shift ID"
);

define_string_id!(
    /// A validated pause identifier.
    ///
    /// Pause IDs must be non-empty strings, generated as UUIDs when a
    /// break starts.
    PauseId, "pause ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("sami").is_ok());
    }

    #[test]
    fn shift_id_rejects_empty() {
        assert!(ShiftId::new("").is_err());
        assert!(ShiftId::new("shift-1").is_ok());
    }

    #[test]
    fn pause_id_rejects_empty() {
        assert!(PauseId::new("").is_err());
        assert!(PauseId::new("pause-1").is_ok());
    }

    #[test]
    fn user_id_serde_roundtrip() {
        let id = UserId::new("worker-7").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"worker-7\"");
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn user_id_serde_rejects_empty() {
        let result: Result<UserId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn shift_id_as_ref() {
        let id = ShiftId::new("abc-123").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "abc-123");
    }

    #[test]
    fn shift_status_roundtrip() {
        for status in [ShiftStatus::Active, ShiftStatus::Paused, ShiftStatus::Ended] {
            let s = status.as_str();
            let parsed: ShiftStatus = s.parse().unwrap();
            assert_eq!(parsed, status);
            assert_eq!(status.to_string(), s);
        }
    }

    #[test]
    fn shift_status_invalid() {
        assert!("done".parse::<ShiftStatus>().is_err());
    }

    #[test]
    fn shift_status_is_open() {
        assert!(ShiftStatus::Active.is_open());
        assert!(ShiftStatus::Paused.is_open());
        assert!(!ShiftStatus::Ended.is_open());
    }

    #[test]
    fn shift_status_serde_matches_as_str() {
        // Serde and SQL storage must agree on the spelling.
        for status in [ShiftStatus::Active, ShiftStatus::Paused, ShiftStatus::Ended] {
            let value = serde_json::to_value(status).unwrap();
            assert_eq!(value.as_str().unwrap(), status.as_str());
        }
    }

    #[test]
    fn role_roundtrip() {
        for role in [Role::Admin, Role::Worker] {
            let s = role.as_str();
            let parsed: Role = s.parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("boss".parse::<Role>().is_err());
    }

    #[test]
    fn role_defaults_to_worker() {
        assert_eq!(Role::default(), Role::Worker);
    }
}
