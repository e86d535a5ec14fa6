//! Work-evidence rules: shift lifecycle and edit-request status workflow.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::page::{SortKey, Sortable};

/// Default window assigned to a freshly started shift.
pub const DEFAULT_SHIFT_LENGTH_HOURS: i64 = 8;

pub fn default_shift_length() -> Duration {
    Duration::hours(DEFAULT_SHIFT_LENGTH_HOURS)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    #[error("The shift has already ended.")]
    AlreadyEnded { shift_id: i64, ended_at: NaiveDateTime },
}

/// One worked time interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: String,
    pub member_id: Option<Uuid>,
}

/// A shift that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShift {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: String,
    pub member_id: Option<Uuid>,
}

impl NewShift {
    /// Opens a shift at `now` with the default window.
    pub fn start(description: impl Into<String>, member_id: Option<Uuid>, now: NaiveDateTime) -> Self {
        Self {
            start_time: now,
            end_time: now + default_shift_length(),
            description: description.into(),
            member_id,
        }
    }

    pub fn with_id(self, id: i64) -> Shift {
        Shift {
            id,
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description,
            member_id: self.member_id,
        }
    }
}

impl Shift {
    /// A shift whose end lies strictly before `now` counts as closed.
    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        self.end_time < now
    }

    /// Closes the shift at `now`.
    pub fn end(&mut self, now: NaiveDateTime) -> Result<(), ShiftError> {
        if self.has_ended(now) {
            return Err(ShiftError::AlreadyEnded {
                shift_id: self.id,
                ended_at: self.end_time,
            });
        }
        self.end_time = now;
        Ok(())
    }

    pub fn reschedule(&mut self, start_time: NaiveDateTime, end_time: NaiveDateTime) {
        self.start_time = start_time;
        self.end_time = end_time;
    }
}

impl Sortable for Shift {
    const SORT_FIELDS: &'static [&'static str] = &["id", "startTime", "endTime"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Int(self.id)),
            "startTime" => Some(SortKey::DateTime(self.start_time)),
            "endTime" => Some(SortKey::DateTime(self.end_time)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown edit request status '{0}'")]
pub struct StatusParseError(pub String);

/// Lifecycle of a shift edit request. Only `Accepted` has a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditRequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl EditRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditRequestStatus::Pending => "pending",
            EditRequestStatus::Accepted => "accepted",
            EditRequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EditRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditRequestStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(EditRequestStatus::Pending),
            "accepted" => Ok(EditRequestStatus::Accepted),
            "rejected" => Ok(EditRequestStatus::Rejected),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

impl Serialize for EditRequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EditRequestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A proposed correction to a shift's recorded time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEditRequest {
    pub id: i64,
    pub status: EditRequestStatus,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub shift_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShiftEditRequest {
    pub status: EditRequestStatus,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub shift_id: i64,
}

impl NewShiftEditRequest {
    pub fn with_id(self, id: i64) -> ShiftEditRequest {
        ShiftEditRequest {
            id,
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            shift_id: self.shift_id,
        }
    }
}

impl ShiftEditRequest {
    /// Overwrites the request's own fields.
    pub fn revise(&mut self, status: EditRequestStatus, start_time: NaiveDateTime, end_time: NaiveDateTime) {
        self.status = status;
        self.start_time = start_time;
        self.end_time = end_time;
    }

    /// Copies the proposed window onto `shift` when accepted.
    ///
    /// Returns whether the shift was modified. Moving the status away from
    /// `Accepted` later does not undo an earlier application.
    pub fn apply_to(&self, shift: &mut Shift) -> bool {
        if self.status != EditRequestStatus::Accepted {
            return false;
        }
        shift.reschedule(self.start_time, self.end_time);
        true
    }
}

impl Sortable for ShiftEditRequest {
    const SORT_FIELDS: &'static [&'static str] = &["id", "status", "startTime"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Int(self.id)),
            "status" => Some(SortKey::Text(self.status.as_str().to_string())),
            "startTime" => Some(SortKey::DateTime(self.start_time)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn shift() -> Shift {
        NewShift::start("Morning", None, at(8, 0)).with_id(1)
    }

    #[test]
    fn test_start_uses_default_window() {
        let shift = shift();
        assert_eq!(shift.start_time, at(8, 0));
        assert_eq!(shift.end_time, at(16, 0));
        assert_eq!(shift.description, "Morning");
    }

    #[test]
    fn test_end_open_shift() {
        let mut shift = shift();
        shift.end(at(8, 0)).unwrap();
        assert_eq!(shift.end_time, at(8, 0));
    }

    #[test]
    fn test_end_at_exact_end_time_succeeds() {
        let mut shift = shift();
        assert!(shift.end(at(16, 0)).is_ok());
    }

    #[test]
    fn test_end_closed_shift_fails() {
        let mut shift = shift();
        shift.end(at(12, 0)).unwrap();

        let err = shift.end(at(13, 0)).unwrap_err();
        assert_eq!(
            err,
            ShiftError::AlreadyEnded {
                shift_id: 1,
                ended_at: at(12, 0)
            }
        );
        assert_eq!(shift.end_time, at(12, 0));
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("ACCEPTED".parse(), Ok(EditRequestStatus::Accepted));
        assert_eq!("Pending".parse(), Ok(EditRequestStatus::Pending));
        assert_eq!(" rejected ".parse(), Ok(EditRequestStatus::Rejected));
        assert!("approved".parse::<EditRequestStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let status: EditRequestStatus = serde_json::from_str("\"Accepted\"").unwrap();
        assert_eq!(status, EditRequestStatus::Accepted);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"accepted\"");
        assert!(serde_json::from_str::<EditRequestStatus>("\"maybe\"").is_err());
    }

    #[test]
    fn test_accepted_request_overwrites_shift() {
        let mut shift = shift();
        let mut request = NewShiftEditRequest {
            status: EditRequestStatus::Pending,
            start_time: at(7, 0),
            end_time: at(15, 0),
            shift_id: shift.id,
        }
        .with_id(10);

        assert!(!request.apply_to(&mut shift));
        assert_eq!(shift.start_time, at(8, 0));

        request.revise(EditRequestStatus::Accepted, at(7, 30), at(15, 30));
        assert!(request.apply_to(&mut shift));
        assert_eq!(shift.start_time, at(7, 30));
        assert_eq!(shift.end_time, at(15, 30));

        request.revise(EditRequestStatus::Rejected, at(9, 0), at(10, 0));
        assert!(!request.apply_to(&mut shift));
        assert_eq!(shift.start_time, at(7, 30));
    }
}
