//! Row types and their conversion into domain entities.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use magjob_core::{
    parse_weekday, AvailabilityTemplate, Chat, ChatMember, ChatMessage, Graphic, Notification,
    NotificationTarget, Shift, ShiftEditRequest, TimeEntry, TimeEntryMember, TimeEntryTemplate,
};
use uuid::Uuid;

use crate::error::AppError;

fn corrupt(table: &str, id: impl std::fmt::Display, detail: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("corrupt {} row {}: {}", table, id, detail))
}

/// Availability template database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AvailabilityTemplateRow {
    pub id: Uuid,
    pub name: String,
    pub organization_id: i64,
    pub start_day_of_week: String,
    pub number_of_days: i32,
}

impl AvailabilityTemplateRow {
    pub fn into_template(
        self,
        time_entry_templates: Vec<TimeEntryTemplate>,
    ) -> Result<AvailabilityTemplate, AppError> {
        let start_day_of_week = parse_weekday(&self.start_day_of_week)
            .map_err(|e| corrupt("availability_templates", self.id, e))?;
        Ok(AvailabilityTemplate {
            id: self.id,
            name: self.name,
            organization_id: self.organization_id,
            start_day_of_week,
            number_of_days: self.number_of_days,
            time_entry_templates,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimeEntryTemplateRow {
    pub id: Uuid,
    pub availability_template_id: Uuid,
    pub start_day_offset: i32,
    pub end_day_offset: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<TimeEntryTemplateRow> for TimeEntryTemplate {
    fn from(row: TimeEntryTemplateRow) -> Self {
        Self {
            id: row.id,
            availability_template_id: row.availability_template_id,
            start_day_offset: row.start_day_offset,
            end_day_offset: row.end_day_offset,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GraphicRow {
    pub id: Uuid,
    pub name: String,
    pub manager_id: i64,
}

impl GraphicRow {
    pub fn into_graphic(self, time_entries: Vec<TimeEntry>, time_entry_members: Vec<TimeEntryMember>) -> Graphic {
        Graphic {
            id: self.id,
            name: self.name,
            manager_id: self.manager_id,
            time_entry_members,
            time_entries,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimeEntryRow {
    pub id: Uuid,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub graphic_id: Option<Uuid>,
}

impl From<TimeEntryRow> for TimeEntry {
    fn from(row: TimeEntryRow) -> Self {
        Self {
            id: row.id,
            start_date_time: row.start_date_time,
            end_date_time: row.end_date_time,
            graphic_id: row.graphic_id,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimeEntryMemberRow {
    pub id: Uuid,
    pub status: String,
    pub member_id: Uuid,
    pub time_entry_id: Option<Uuid>,
    pub graphic_id: Option<Uuid>,
}

impl From<TimeEntryMemberRow> for TimeEntryMember {
    fn from(row: TimeEntryMemberRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            member_id: row.member_id,
            time_entry_id: row.time_entry_id,
            graphic_id: row.graphic_id,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShiftRow {
    pub id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: String,
    pub member_id: Option<Uuid>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Self {
            id: row.id,
            start_time: row.start_time,
            end_time: row.end_time,
            description: row.description,
            member_id: row.member_id,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShiftEditRequestRow {
    pub id: i64,
    pub status: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub shift_id: i64,
}

impl TryFrom<ShiftEditRequestRow> for ShiftEditRequest {
    type Error = AppError;

    fn try_from(row: ShiftEditRequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| corrupt("shift_edit_requests", row.id, e))?;
        Ok(Self {
            id: row.id,
            status,
            start_time: row.start_time,
            end_time: row.end_time,
            shift_id: row.shift_id,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatRow {
    pub id: Uuid,
    pub title: String,
    pub organization_id: Uuid,
    pub date_of_creation: NaiveDate,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            organization_id: row.organization_id,
            date_of_creation: row.date_of_creation,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMemberRow {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub member_id: Uuid,
    pub nickname: String,
    pub is_invitation_accepted: bool,
    pub is_admin: bool,
}

impl From<ChatMemberRow> for ChatMember {
    fn from(row: ChatMemberRow) -> Self {
        Self {
            id: row.id,
            chat_id: row.chat_id,
            member_id: row.member_id,
            nickname: row.nickname,
            is_invitation_accepted: row.is_invitation_accepted,
            is_admin: row.is_admin,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessageRow {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub chat_member_id: Uuid,
    pub content: String,
    pub attachment: Option<String>,
    pub viewed_by: Vec<String>,
    pub first_and_last_name: Option<String>,
    pub sent_at: NaiveDateTime,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: row.id,
            chat_id: row.chat_id,
            chat_member_id: row.chat_member_id,
            content: row.content,
            attachment: row.attachment,
            viewed_by: row.viewed_by,
            first_and_last_name: row.first_and_last_name,
            sent_at: row.sent_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub content: String,
    pub date_of_creation: NaiveDateTime,
    pub seen: bool,
    pub sent: bool,
    pub user_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let target = NotificationTarget::from_fields(row.user_id, row.member_id, row.organization_id)
            .map_err(|e| corrupt("notifications", row.id, e))?;
        Ok(Self {
            id: row.id,
            content: row.content,
            date_of_creation: row.date_of_creation,
            seen: row.seen,
            sent: row.sent,
            target,
        })
    }
}
