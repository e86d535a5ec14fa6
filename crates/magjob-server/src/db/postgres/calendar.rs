use async_trait::async_trait;
use magjob_core::{
    weekday_name, AvailabilityTemplate, Graphic, Page, PageRequest, TimeEntry, TimeEntryMember,
    TimeEntryTemplate,
};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{order_by, total, Database, SortColumns};
use crate::db::models::{
    AvailabilityTemplateRow, GraphicRow, TimeEntryMemberRow, TimeEntryRow, TimeEntryTemplateRow,
};
use crate::db::repository::{CalendarRepository, RepoResult};
use crate::error::AppError;

const TEMPLATE_SORT: SortColumns = &[
    ("id", "id"),
    ("name", "name"),
    ("numberOfDays", "number_of_days"),
    ("organizationId", "organization_id"),
];
const GRAPHIC_SORT: SortColumns = &[("id", "id"), ("name", "name"), ("managerId", "manager_id")];
const TIME_ENTRY_SORT: SortColumns = &[
    ("id", "id"),
    ("startDateTime", "start_date_time"),
    ("endDateTime", "end_date_time"),
];
const MEMBER_SORT: SortColumns = &[("id", "id"), ("status", "status"), ("memberId", "member_id")];

impl Database {
    async fn entry_templates_for(
        &self,
        template_ids: &[Uuid],
    ) -> RepoResult<HashMap<Uuid, Vec<TimeEntryTemplate>>> {
        let rows = sqlx::query_as::<_, TimeEntryTemplateRow>(
            r#"SELECT id, availability_template_id, start_day_offset, end_day_offset, start_time, end_time
               FROM time_entry_templates
               WHERE availability_template_id = ANY($1)
               ORDER BY position"#,
        )
        .bind(template_ids)
        .fetch_all(self.pool())
        .await?;

        let mut grouped: HashMap<Uuid, Vec<TimeEntryTemplate>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.availability_template_id)
                .or_default()
                .push(row.into());
        }
        Ok(grouped)
    }

    async fn assemble_templates(
        &self,
        rows: Vec<AvailabilityTemplateRow>,
    ) -> RepoResult<Vec<AvailabilityTemplate>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut entries = self.entry_templates_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let own = entries.remove(&row.id).unwrap_or_default();
                row.into_template(own)
            })
            .collect()
    }

    async fn templates_page(
        &self,
        organization_id: Option<i64>,
        page: &PageRequest,
    ) -> RepoResult<Page<AvailabilityTemplate>> {
        let sql = format!(
            r#"SELECT id, name, organization_id, start_day_of_week, number_of_days
               FROM availability_templates
               WHERE ($1::BIGINT IS NULL OR organization_id = $1)
               {} LIMIT $2 OFFSET $3"#,
            order_by(page, TEMPLATE_SORT)?
        );
        let rows = sqlx::query_as::<_, AvailabilityTemplateRow>(&sql)
            .bind(organization_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM availability_templates WHERE ($1::BIGINT IS NULL OR organization_id = $1)"#,
        )
        .bind(organization_id)
        .fetch_one(self.pool())
        .await?;

        Ok(Page {
            items: self.assemble_templates(rows).await?,
            total: total(count),
        })
    }

    async fn children_of(
        &self,
        graphic_ids: &[Uuid],
    ) -> RepoResult<(HashMap<Uuid, Vec<TimeEntry>>, HashMap<Uuid, Vec<TimeEntryMember>>)> {
        let entries = sqlx::query_as::<_, TimeEntryRow>(
            r#"SELECT id, start_date_time, end_date_time, graphic_id
               FROM time_entries
               WHERE graphic_id = ANY($1)
               ORDER BY position"#,
        )
        .bind(graphic_ids)
        .fetch_all(self.pool())
        .await?;
        let members = sqlx::query_as::<_, TimeEntryMemberRow>(
            r#"SELECT id, status, member_id, time_entry_id, graphic_id
               FROM time_entry_members
               WHERE graphic_id = ANY($1)
               ORDER BY id"#,
        )
        .bind(graphic_ids)
        .fetch_all(self.pool())
        .await?;

        let mut entries_by_graphic: HashMap<Uuid, Vec<TimeEntry>> = HashMap::new();
        for row in entries {
            if let Some(graphic_id) = row.graphic_id {
                entries_by_graphic.entry(graphic_id).or_default().push(row.into());
            }
        }
        let mut members_by_graphic: HashMap<Uuid, Vec<TimeEntryMember>> = HashMap::new();
        for row in members {
            if let Some(graphic_id) = row.graphic_id {
                members_by_graphic.entry(graphic_id).or_default().push(row.into());
            }
        }
        Ok((entries_by_graphic, members_by_graphic))
    }

    async fn assemble_graphics(&self, rows: Vec<GraphicRow>) -> RepoResult<Vec<Graphic>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let (mut entries, mut members) = self.children_of(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let own_entries = entries.remove(&row.id).unwrap_or_default();
                let own_members = members.remove(&row.id).unwrap_or_default();
                row.into_graphic(own_entries, own_members)
            })
            .collect())
    }

    async fn graphics_page(&self, member_id: Option<Uuid>, page: &PageRequest) -> RepoResult<Page<Graphic>> {
        const FILTER: &str = r#"($1::UUID IS NULL OR EXISTS (
                SELECT 1 FROM time_entry_members m
                WHERE m.graphic_id = graphics.id AND m.member_id = $1))"#;
        let sql = format!(
            "SELECT id, name, manager_id FROM graphics WHERE {} {} LIMIT $2 OFFSET $3",
            FILTER,
            order_by(page, GRAPHIC_SORT)?
        );
        let rows = sqlx::query_as::<_, GraphicRow>(&sql)
            .bind(member_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM graphics WHERE {}", FILTER))
            .bind(member_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: self.assemble_graphics(rows).await?,
            total: total(count),
        })
    }

    async fn members_page(
        &self,
        member_id: Option<Uuid>,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntryMember>> {
        let sql = format!(
            r#"SELECT id, status, member_id, time_entry_id, graphic_id
               FROM time_entry_members
               WHERE ($1::UUID IS NULL OR member_id = $1)
               {} LIMIT $2 OFFSET $3"#,
            order_by(page, MEMBER_SORT)?
        );
        let rows = sqlx::query_as::<_, TimeEntryMemberRow>(&sql)
            .bind(member_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM time_entry_members WHERE ($1::UUID IS NULL OR member_id = $1)",
        )
        .bind(member_id)
        .fetch_one(self.pool())
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }
}

async fn insert_entry_templates(
    tx: &mut Transaction<'_, Postgres>,
    template: &AvailabilityTemplate,
) -> RepoResult<()> {
    for (position, entry) in template.time_entry_templates.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO time_entry_templates
               (id, availability_template_id, position, start_day_offset, end_day_offset, start_time, end_time)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(entry.id)
        .bind(template.id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(entry.start_day_offset)
        .bind(entry.end_day_offset)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_entries(tx: &mut Transaction<'_, Postgres>, entries: &[TimeEntry]) -> RepoResult<()> {
    for entry in entries {
        sqlx::query(
            "INSERT INTO time_entries (id, start_date_time, end_date_time, graphic_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.id)
        .bind(entry.start_date_time)
        .bind(entry.end_date_time)
        .bind(entry.graphic_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_members(tx: &mut Transaction<'_, Postgres>, members: &[TimeEntryMember]) -> RepoResult<()> {
    for member in members {
        sqlx::query(
            r#"INSERT INTO time_entry_members (id, status, member_id, time_entry_id, graphic_id)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(member.id)
        .bind(&member.status)
        .bind(member.member_id)
        .bind(member.time_entry_id)
        .bind(member.graphic_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl CalendarRepository for Database {
    async fn list_templates(&self, page: &PageRequest) -> RepoResult<Page<AvailabilityTemplate>> {
        self.templates_page(None, page).await
    }

    async fn list_templates_by_organization(
        &self,
        organization_id: i64,
        page: &PageRequest,
    ) -> RepoResult<Page<AvailabilityTemplate>> {
        self.templates_page(Some(organization_id), page).await
    }

    async fn find_template(&self, id: Uuid) -> RepoResult<Option<AvailabilityTemplate>> {
        let row = sqlx::query_as::<_, AvailabilityTemplateRow>(
            r#"SELECT id, name, organization_id, start_day_of_week, number_of_days
               FROM availability_templates WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(self.assemble_templates(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_template(&self, template: &AvailabilityTemplate) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"INSERT INTO availability_templates (id, name, organization_id, start_day_of_week, number_of_days)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.organization_id)
        .bind(weekday_name(template.start_day_of_week))
        .bind(template.number_of_days)
        .execute(&mut *tx)
        .await?;
        insert_entry_templates(&mut tx, template).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_template(&self, template: &AvailabilityTemplate) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"UPDATE availability_templates
               SET name = $2, organization_id = $3, start_day_of_week = $4, number_of_days = $5
               WHERE id = $1"#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.organization_id)
        .bind(weekday_name(template.start_day_of_week))
        .bind(template.number_of_days)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM time_entry_templates WHERE availability_template_id = $1")
            .bind(template.id)
            .execute(&mut *tx)
            .await?;
        insert_entry_templates(&mut tx, template).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_template(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM availability_templates WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_graphics(&self, page: &PageRequest) -> RepoResult<Page<Graphic>> {
        self.graphics_page(None, page).await
    }

    async fn list_graphics_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<Graphic>> {
        self.graphics_page(Some(member_id), page).await
    }

    async fn find_graphic(&self, id: Uuid) -> RepoResult<Option<Graphic>> {
        let row = sqlx::query_as::<_, GraphicRow>("SELECT id, name, manager_id FROM graphics WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(self.assemble_graphics(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_graphic(&self, graphic: &Graphic) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("INSERT INTO graphics (id, name, manager_id) VALUES ($1, $2, $3)")
            .bind(graphic.id)
            .bind(&graphic.name)
            .bind(graphic.manager_id)
            .execute(&mut *tx)
            .await?;
        insert_entries(&mut tx, &graphic.time_entries).await?;
        insert_members(&mut tx, &graphic.time_entry_members).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_graphic(&self, graphic: &Graphic) -> RepoResult<()> {
        sqlx::query("UPDATE graphics SET name = $2, manager_id = $3 WHERE id = $1")
            .bind(graphic.id)
            .bind(&graphic.name)
            .bind(graphic.manager_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn append_to_graphic(
        &self,
        graphic_id: Uuid,
        entries: &[TimeEntry],
        members: &[TimeEntryMember],
    ) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        // Lock the graphic so a concurrent delete cannot orphan the new rows
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM graphics WHERE id = $1 FOR UPDATE")
            .bind(graphic_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::not_found("Graphic", graphic_id));
        }
        insert_entries(&mut tx, entries).await?;
        insert_members(&mut tx, members).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_graphic(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM graphics WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_time_entry(&self, id: Uuid) -> RepoResult<Option<TimeEntry>> {
        let row = sqlx::query_as::<_, TimeEntryRow>(
            "SELECT id, start_date_time, end_date_time, graphic_id FROM time_entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_time_entries_by_graphic(
        &self,
        graphic_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntry>> {
        let sql = format!(
            r#"SELECT id, start_date_time, end_date_time, graphic_id
               FROM time_entries WHERE graphic_id = $1
               {} LIMIT $2 OFFSET $3"#,
            order_by(page, TIME_ENTRY_SORT)?
        );
        let rows = sqlx::query_as::<_, TimeEntryRow>(&sql)
            .bind(graphic_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM time_entries WHERE graphic_id = $1")
            .bind(graphic_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }

    async fn insert_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        insert_entries(&mut tx, std::slice::from_ref(entry)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        sqlx::query(
            "UPDATE time_entries SET start_date_time = $2, end_date_time = $3, graphic_id = $4 WHERE id = $1",
        )
        .bind(entry.id)
        .bind(entry.start_date_time)
        .bind(entry.end_date_time)
        .bind(entry.graphic_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_time_entry(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_time_entry_members(&self, page: &PageRequest) -> RepoResult<Page<TimeEntryMember>> {
        self.members_page(None, page).await
    }

    async fn list_time_entry_members_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntryMember>> {
        self.members_page(Some(member_id), page).await
    }

    async fn find_time_entry_member(&self, id: Uuid) -> RepoResult<Option<TimeEntryMember>> {
        let row = sqlx::query_as::<_, TimeEntryMemberRow>(
            "SELECT id, status, member_id, time_entry_id, graphic_id FROM time_entry_members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_time_entry_member(&self, member: &TimeEntryMember) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        insert_members(&mut tx, std::slice::from_ref(member)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_time_entry_member(&self, member: &TimeEntryMember) -> RepoResult<()> {
        sqlx::query(
            r#"UPDATE time_entry_members
               SET status = $2, member_id = $3, time_entry_id = $4, graphic_id = $5
               WHERE id = $1"#,
        )
        .bind(member.id)
        .bind(&member.status)
        .bind(member.member_id)
        .bind(member.time_entry_id)
        .bind(member.graphic_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_time_entry_member(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM time_entry_members WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
