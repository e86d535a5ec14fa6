use chrono::NaiveDateTime;
use magjob_core::{Page, PageRequest, TimeEntry, TimeEntryMember};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::CalendarRepository;
use crate::error::AppError;
use crate::identity::Identity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeEntry {
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub graphic_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryPatch {
    pub start_date_time: Option<NaiveDateTime>,
    pub end_date_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeEntryMember {
    pub status: String,
    pub member_id: Uuid,
    pub time_entry_id: Option<Uuid>,
    pub graphic_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryMemberPatch {
    pub status: String,
}

async fn ensure_graphic(calendar: &dyn CalendarRepository, graphic_id: Option<Uuid>) -> Result<(), AppError> {
    if let Some(id) = graphic_id {
        if calendar.find_graphic(id).await?.is_none() {
            return Err(AppError::not_found("Graphic", id));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct TimeEntryService {
    calendar: Arc<dyn CalendarRepository>,
}

impl TimeEntryService {
    pub fn new(calendar: Arc<dyn CalendarRepository>) -> Self {
        Self { calendar }
    }

    pub async fn find(&self, id: Uuid) -> Result<TimeEntry, AppError> {
        self.calendar
            .find_time_entry(id)
            .await?
            .ok_or_else(|| AppError::not_found("Time entry", id))
    }

    pub async fn list_by_graphic(&self, graphic_id: Uuid, page: &PageRequest) -> Result<Page<TimeEntry>, AppError> {
        ensure_graphic(self.calendar.as_ref(), Some(graphic_id)).await?;
        self.calendar.list_time_entries_by_graphic(graphic_id, page).await
    }

    pub async fn create(&self, request: NewTimeEntry) -> Result<TimeEntry, AppError> {
        ensure_graphic(self.calendar.as_ref(), request.graphic_id).await?;
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: request.start_date_time,
            end_date_time: request.end_date_time,
            graphic_id: request.graphic_id,
        };
        self.calendar.insert_time_entry(&entry).await?;
        Ok(entry)
    }

    pub async fn update(&self, id: Uuid, patch: TimeEntryPatch) -> Result<TimeEntry, AppError> {
        let mut entry = self.find(id).await?;
        if let Some(start) = patch.start_date_time {
            entry.start_date_time = start;
        }
        if let Some(end) = patch.end_date_time {
            entry.end_date_time = end;
        }
        self.calendar.update_time_entry(&entry).await?;
        Ok(entry)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.calendar.delete_time_entry(id).await? {
            return Err(AppError::not_found("Time entry", id));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct TimeEntryMemberService {
    calendar: Arc<dyn CalendarRepository>,
}

impl TimeEntryMemberService {
    pub fn new(calendar: Arc<dyn CalendarRepository>) -> Self {
        Self { calendar }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<TimeEntryMember>, AppError> {
        self.calendar.list_time_entry_members(page).await
    }

    pub async fn list_by_user(
        &self,
        identity: Identity,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<TimeEntryMember>, AppError> {
        identity.ensure_is(user_id)?;
        self.calendar
            .list_time_entry_members_by_member(user_id, page)
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<TimeEntryMember, AppError> {
        self.calendar
            .find_time_entry_member(id)
            .await?
            .ok_or_else(|| AppError::not_found("Time entry member", id))
    }

    pub async fn create(&self, request: NewTimeEntryMember) -> Result<TimeEntryMember, AppError> {
        ensure_graphic(self.calendar.as_ref(), request.graphic_id).await?;
        if let Some(entry_id) = request.time_entry_id {
            if self.calendar.find_time_entry(entry_id).await?.is_none() {
                return Err(AppError::not_found("Time entry", entry_id));
            }
        }
        let member = TimeEntryMember {
            id: Uuid::new_v4(),
            status: request.status,
            member_id: request.member_id,
            time_entry_id: request.time_entry_id,
            graphic_id: request.graphic_id,
        };
        self.calendar.insert_time_entry_member(&member).await?;
        Ok(member)
    }

    pub async fn update(&self, id: Uuid, patch: TimeEntryMemberPatch) -> Result<TimeEntryMember, AppError> {
        let mut member = self.find(id).await?;
        member.status = patch.status;
        self.calendar.update_time_entry_member(&member).await?;
        Ok(member)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.calendar.delete_time_entry_member(id).await? {
            return Err(AppError::not_found("Time entry member", id));
        }
        Ok(())
    }
}
