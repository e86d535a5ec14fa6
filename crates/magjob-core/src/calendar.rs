use chrono::{NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::page::{SortKey, Sortable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("number of days must be at least 1, got {0}")]
    InvalidNumberOfDays(i32),
    #[error("unknown day of week '{0}'")]
    UnknownWeekday(String),
}

/// Parses `MONDAY`, `monday` or `Mon`.
pub fn parse_weekday(value: &str) -> Result<Weekday, CalendarError> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| CalendarError::UnknownWeekday(value.to_string()))
}

/// Upper-case full name, e.g. `MONDAY`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Serde adapter for [`Weekday`] using [`weekday_name`] / [`parse_weekday`].
pub mod weekday_serde {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::weekday_name(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_weekday(&raw).map_err(serde::de::Error::custom)
    }
}

/// One recurring slot of an availability template, relative to the cycle start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryTemplate {
    pub id: Uuid,
    pub availability_template_id: Uuid,
    pub start_day_offset: i32,
    pub end_day_offset: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A reusable weekly/cyclic pattern of time slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityTemplate {
    pub id: Uuid,
    pub name: String,
    pub organization_id: i64,
    #[serde(with = "weekday_serde")]
    pub start_day_of_week: Weekday,
    pub number_of_days: i32,
    pub time_entry_templates: Vec<TimeEntryTemplate>,
}

impl AvailabilityTemplate {
    pub fn validate(&self) -> Result<(), CalendarError> {
        validate_number_of_days(self.number_of_days)
    }
}

pub fn validate_number_of_days(days: i32) -> Result<(), CalendarError> {
    if days < 1 {
        return Err(CalendarError::InvalidNumberOfDays(days));
    }
    Ok(())
}

impl Sortable for AvailabilityTemplate {
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "numberOfDays", "organizationId"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "name" => Some(SortKey::Text(self.name.clone())),
            "numberOfDays" => Some(SortKey::Int(i64::from(self.number_of_days))),
            "organizationId" => Some(SortKey::Int(self.organization_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub graphic_id: Option<Uuid>,
}

impl Sortable for TimeEntry {
    const SORT_FIELDS: &'static [&'static str] = &["id", "startDateTime", "endDateTime"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "startDateTime" => Some(SortKey::DateTime(self.start_date_time)),
            "endDateTime" => Some(SortKey::DateTime(self.end_date_time)),
            _ => None,
        }
    }
}

/// A member's participation in a graphic or a single time entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryMember {
    pub id: Uuid,
    pub status: String,
    pub member_id: Uuid,
    pub time_entry_id: Option<Uuid>,
    pub graphic_id: Option<Uuid>,
}

impl Sortable for TimeEntryMember {
    const SORT_FIELDS: &'static [&'static str] = &["id", "status", "memberId"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "status" => Some(SortKey::Text(self.status.clone())),
            "memberId" => Some(SortKey::Id(self.member_id)),
            _ => None,
        }
    }
}

/// A named shift board aggregating time entries and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graphic {
    pub id: Uuid,
    pub name: String,
    pub manager_id: i64,
    pub time_entry_members: Vec<TimeEntryMember>,
    pub time_entries: Vec<TimeEntry>,
}

impl Graphic {
    pub fn new(name: impl Into<String>, manager_id: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            manager_id,
            time_entry_members: Vec::new(),
            time_entries: Vec::new(),
        }
    }

    /// Attach entries, re-pointing each one at this graphic.
    pub fn attach_time_entries(&mut self, entries: impl IntoIterator<Item = TimeEntry>) {
        let id = self.id;
        self.time_entries.extend(entries.into_iter().map(|mut entry| {
            entry.graphic_id = Some(id);
            entry
        }));
    }

    pub fn attach_members(&mut self, members: impl IntoIterator<Item = TimeEntryMember>) {
        let id = self.id;
        self.time_entry_members
            .extend(members.into_iter().map(|mut member| {
                member.graphic_id = Some(id);
                member
            }));
    }

    pub fn has_member(&self, member_id: Uuid) -> bool {
        self.time_entry_members
            .iter()
            .any(|member| member.member_id == member_id)
    }
}

impl Sortable for Graphic {
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "managerId"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "name" => Some(SortKey::Text(self.name.clone())),
            "managerId" => Some(SortKey::Int(self.manager_id)),
            _ => None,
        }
    }
}
