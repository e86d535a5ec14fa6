//! Expansion of availability templates into concrete, dated time entries.
//!
//! A template entry is expressed relative to the start of a cycle: a day
//! offset plus a time of day for each end. Anchoring it to a calendar date
//! yields one concrete interval per template entry, in template order.
//! Overlapping entries, zero-length entries and negative offsets are passed
//! through unchanged.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::{TimeEntry, TimeEntryTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    #[error("{date} shifted by {offset} days is outside the supported calendar range")]
    OutOfRange { date: NaiveDate, offset: i32 },
}

/// A concrete interval produced from one template entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    pub fn into_time_entry(self, graphic_id: Option<Uuid>) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: self.start,
            end_date_time: self.end,
            graphic_id,
        }
    }
}

/// `date + offset days` at `time`.
pub fn at_offset(date: NaiveDate, offset: i32, time: NaiveTime) -> Result<NaiveDateTime, ExpansionError> {
    date.checked_add_signed(Duration::days(i64::from(offset)))
        .map(|day| day.and_time(time))
        .ok_or(ExpansionError::OutOfRange { date, offset })
}

/// Expand `templates` against `start_date`, one slot per template entry.
pub fn expand(
    start_date: NaiveDate,
    templates: &[TimeEntryTemplate],
) -> Result<Vec<TimeSlot>, ExpansionError> {
    templates
        .iter()
        .map(|template| {
            Ok(TimeSlot {
                start: at_offset(start_date, template.start_day_offset, template.start_time)?,
                end: at_offset(start_date, template.end_day_offset, template.end_time)?,
            })
        })
        .collect()
}

/// Expand and materialise fresh time entries owned by `graphic_id`.
pub fn expand_into_entries(
    start_date: NaiveDate,
    templates: &[TimeEntryTemplate],
    graphic_id: Uuid,
) -> Result<Vec<TimeEntry>, ExpansionError> {
    Ok(expand(start_date, templates)?
        .into_iter()
        .map(|slot| slot.into_time_entry(Some(graphic_id)))
        .collect())
}
