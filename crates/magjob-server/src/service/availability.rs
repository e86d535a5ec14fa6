use chrono::{NaiveDate, NaiveTime, Weekday};
use magjob_core::calendar::weekday_serde;
use magjob_core::{
    expand_into_entries, validate_number_of_days, AvailabilityTemplate, Graphic, Page, PageRequest,
    TimeEntryMember, TimeEntryTemplate,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::CalendarRepository;
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryTemplateDraft {
    pub start_day_offset: i32,
    pub end_day_offset: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeEntryTemplateDraft {
    fn into_template(self, availability_template_id: Uuid) -> TimeEntryTemplate {
        TimeEntryTemplate {
            id: Uuid::new_v4(),
            availability_template_id,
            start_day_offset: self.start_day_offset,
            end_day_offset: self.end_day_offset,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

fn drafts_into_templates(drafts: Vec<TimeEntryTemplateDraft>, owner: Uuid) -> Vec<TimeEntryTemplate> {
    drafts.into_iter().map(|d| d.into_template(owner)).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAvailabilityTemplate {
    pub name: String,
    pub organization_id: i64,
    #[serde(with = "weekday_serde")]
    pub start_day_of_week: Weekday,
    pub number_of_days: i32,
    #[serde(default)]
    pub time_entry_templates: Vec<TimeEntryTemplateDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityTemplatePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_weekday")]
    pub start_day_of_week: Option<Weekday>,
    pub number_of_days: Option<i32>,
    /// Replaces the whole list when present.
    pub time_entry_templates: Option<Vec<TimeEntryTemplateDraft>>,
}

fn optional_weekday<'de, D>(deserializer: D) -> Result<Option<Weekday>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|day| magjob_core::parse_weekday(&day).map_err(serde::de::Error::custom))
        .transpose()
}

/// A member to add to a graphic while populating it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryMemberDraft {
    pub status: String,
    pub member_id: Uuid,
    pub time_entry_id: Option<Uuid>,
}

impl TimeEntryMemberDraft {
    pub fn into_member(self, graphic_id: Uuid) -> TimeEntryMember {
        TimeEntryMember {
            id: Uuid::new_v4(),
            status: self.status,
            member_id: self.member_id,
            time_entry_id: self.time_entry_id,
            graphic_id: Some(graphic_id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateGraphic {
    pub graphic_id: Uuid,
    pub availability_template_id: Uuid,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub time_entry_members: Vec<TimeEntryMemberDraft>,
}

#[derive(Clone)]
pub struct AvailabilityTemplateService {
    calendar: Arc<dyn CalendarRepository>,
}

impl AvailabilityTemplateService {
    pub fn new(calendar: Arc<dyn CalendarRepository>) -> Self {
        Self { calendar }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<AvailabilityTemplate>, AppError> {
        self.calendar.list_templates(page).await
    }

    pub async fn list_by_organization(
        &self,
        organization_id: i64,
        page: &PageRequest,
    ) -> Result<Page<AvailabilityTemplate>, AppError> {
        self.calendar
            .list_templates_by_organization(organization_id, page)
            .await
    }

    pub async fn find(&self, id: Uuid) -> Result<AvailabilityTemplate, AppError> {
        self.calendar
            .find_template(id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability template", id))
    }

    pub async fn create(&self, request: NewAvailabilityTemplate) -> Result<AvailabilityTemplate, AppError> {
        validate_number_of_days(request.number_of_days)?;
        let id = Uuid::new_v4();
        let template = AvailabilityTemplate {
            id,
            name: request.name,
            organization_id: request.organization_id,
            start_day_of_week: request.start_day_of_week,
            number_of_days: request.number_of_days,
            time_entry_templates: drafts_into_templates(request.time_entry_templates, id),
        };
        self.calendar.insert_template(&template).await?;
        tracing::info!(
            "Created availability template {} with {} entries",
            template.id,
            template.time_entry_templates.len()
        );
        Ok(template)
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: AvailabilityTemplatePatch,
    ) -> Result<AvailabilityTemplate, AppError> {
        let mut template = self.find(id).await?;
        if let Some(name) = patch.name {
            template.name = name;
        }
        if let Some(day) = patch.start_day_of_week {
            template.start_day_of_week = day;
        }
        if let Some(days) = patch.number_of_days {
            template.number_of_days = days;
        }
        if let Some(drafts) = patch.time_entry_templates {
            template.time_entry_templates = drafts_into_templates(drafts, id);
        }
        template.validate()?;

        self.calendar.save_template(&template).await?;
        Ok(template)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.calendar.delete_template(id).await? {
            return Err(AppError::not_found("Availability template", id));
        }
        Ok(())
    }

    pub async fn time_entry_templates(&self, id: Uuid) -> Result<Vec<TimeEntryTemplate>, AppError> {
        Ok(self.find(id).await?.time_entry_templates)
    }

    /// Expand a template into an existing graphic.
    pub async fn populate_graphic(&self, request: PopulateGraphic) -> Result<Graphic, AppError> {
        let graphic_id = request.graphic_id;
        if self.calendar.find_graphic(graphic_id).await?.is_none() {
            return Err(AppError::not_found("Graphic", graphic_id));
        }
        let template = self.find(request.availability_template_id).await?;

        let entries = expand_into_entries(request.start_date, &template.time_entry_templates, graphic_id)?;
        let members: Vec<TimeEntryMember> = request
            .time_entry_members
            .into_iter()
            .map(|m| m.into_member(graphic_id))
            .collect();
        self.calendar
            .append_to_graphic(graphic_id, &entries, &members)
            .await?;

        tracing::info!(
            "Populated graphic {} from template {} starting {} ({} entries)",
            graphic_id,
            template.id,
            request.start_date,
            entries.len()
        );
        self.calendar
            .find_graphic(graphic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Graphic", graphic_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> (AvailabilityTemplateService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AvailabilityTemplateService::new(store.clone()), store)
    }

    fn nine_to_five() -> TimeEntryTemplateDraft {
        TimeEntryTemplateDraft {
            start_day_offset: 0,
            end_day_offset: 0,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }

    fn request(entries: Vec<TimeEntryTemplateDraft>) -> NewAvailabilityTemplate {
        NewAvailabilityTemplate {
            name: "Week".to_string(),
            organization_id: 1,
            start_day_of_week: Weekday::Mon,
            number_of_days: 7,
            time_entry_templates: entries,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_zero_days() {
        let (service, _) = service();
        let mut bad = request(vec![]);
        bad.number_of_days = 0;
        assert!(matches!(service.create(bad).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_entries_only_when_given() {
        let (service, _) = service();
        let created = service.create(request(vec![nine_to_five()])).await.unwrap();

        let renamed = service
            .update(
                created.id,
                AvailabilityTemplatePatch {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.time_entry_templates, created.time_entry_templates);

        let cleared = service
            .update(
                created.id,
                AvailabilityTemplatePatch {
                    time_entry_templates: Some(vec![]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.time_entry_templates.is_empty());
    }

    #[tokio::test]
    async fn test_populate_appends_generated_entries() {
        let (service, store) = service();
        let template = service.create(request(vec![nine_to_five()])).await.unwrap();
        let graphic = Graphic::new("June", 3);
        store.insert_graphic(&graphic).await.unwrap();

        let member_id = Uuid::new_v4();
        let populated = service
            .populate_graphic(PopulateGraphic {
                graphic_id: graphic.id,
                availability_template_id: template.id,
                start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                time_entry_members: vec![TimeEntryMemberDraft {
                    status: "assigned".to_string(),
                    member_id,
                    time_entry_id: None,
                }],
            })
            .await
            .unwrap();

        assert_eq!(populated.time_entries.len(), 1);
        let entry = &populated.time_entries[0];
        assert_eq!(entry.start_date_time.to_string(), "2025-06-02 09:00:00");
        assert_eq!(entry.end_date_time.to_string(), "2025-06-02 17:00:00");
        assert_eq!(entry.graphic_id, Some(graphic.id));
        assert!(populated.has_member(member_id));
    }

    #[tokio::test]
    async fn test_populate_missing_template_is_not_found() {
        let (service, store) = service();
        let graphic = Graphic::new("June", 3);
        store.insert_graphic(&graphic).await.unwrap();

        let result = service
            .populate_graphic(PopulateGraphic {
                graphic_id: graphic.id,
                availability_template_id: Uuid::new_v4(),
                start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                time_entry_members: vec![],
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
