use chrono::{NaiveDate, NaiveDateTime};
use magjob_core::{expand_into_entries, Graphic, Page, PageRequest, TimeEntry};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::availability::TimeEntryMemberDraft;
use crate::db::CalendarRepository;
use crate::error::AppError;
use crate::identity::Identity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryDraft {
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGraphic {
    pub name: String,
    pub manager_id: i64,
    #[serde(default)]
    pub time_entries: Vec<TimeEntryDraft>,
    #[serde(default)]
    pub time_entry_members: Vec<TimeEntryMemberDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicPatch {
    pub name: Option<String>,
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAndPopulateGraphic {
    pub availability_template_id: Uuid,
    pub name: String,
    pub manager_id: i64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub time_entry_members: Vec<TimeEntryMemberDraft>,
}

#[derive(Clone)]
pub struct GraphicService {
    calendar: Arc<dyn CalendarRepository>,
}

impl GraphicService {
    pub fn new(calendar: Arc<dyn CalendarRepository>) -> Self {
        Self { calendar }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Graphic>, AppError> {
        self.calendar.list_graphics(page).await
    }

    /// Graphics the user takes part in. Only the user may ask.
    pub async fn list_by_user(
        &self,
        identity: Identity,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<Graphic>, AppError> {
        identity.ensure_is(user_id)?;
        self.calendar.list_graphics_by_member(user_id, page).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Graphic, AppError> {
        self.calendar
            .find_graphic(id)
            .await?
            .ok_or_else(|| AppError::not_found("Graphic", id))
    }

    pub async fn create(&self, request: NewGraphic) -> Result<Graphic, AppError> {
        let mut graphic = Graphic::new(request.name, request.manager_id);
        let graphic_id = graphic.id;
        graphic.attach_time_entries(request.time_entries.into_iter().map(|draft| TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: draft.start_date_time,
            end_date_time: draft.end_date_time,
            graphic_id: Some(graphic_id),
        }));
        graphic.attach_members(
            request
                .time_entry_members
                .into_iter()
                .map(|draft| draft.into_member(graphic_id)),
        );
        self.calendar.insert_graphic(&graphic).await?;
        self.find(graphic_id).await
    }

    pub async fn update(&self, id: Uuid, patch: GraphicPatch) -> Result<Graphic, AppError> {
        let mut graphic = self.find(id).await?;
        if let Some(name) = patch.name {
            graphic.name = name;
        }
        if let Some(manager_id) = patch.manager_id {
            graphic.manager_id = manager_id;
        }
        self.calendar.update_graphic(&graphic).await?;
        Ok(graphic)
    }

    /// Removes the graphic with its time entries and members.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.calendar.delete_graphic(id).await? {
            return Err(AppError::not_found("Graphic", id));
        }
        tracing::info!("Deleted graphic {}", id);
        Ok(())
    }

    /// Build a new graphic from an availability template, stored in one write.
    pub async fn create_and_populate(&self, request: CreateAndPopulateGraphic) -> Result<Graphic, AppError> {
        let template = self
            .calendar
            .find_template(request.availability_template_id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability template", request.availability_template_id))?;

        let mut graphic = Graphic::new(request.name, request.manager_id);
        let graphic_id = graphic.id;
        graphic.attach_time_entries(expand_into_entries(
            request.start_date,
            &template.time_entry_templates,
            graphic_id,
        )?);
        graphic.attach_members(
            request
                .time_entry_members
                .into_iter()
                .map(|draft| draft.into_member(graphic_id)),
        );
        self.calendar.insert_graphic(&graphic).await?;

        tracing::info!(
            "Created graphic {} from template {} starting {} ({} entries)",
            graphic_id,
            template.id,
            request.start_date,
            graphic.time_entries.len()
        );
        self.find(graphic_id).await
    }
}
