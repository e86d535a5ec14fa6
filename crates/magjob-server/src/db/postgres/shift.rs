use async_trait::async_trait;
use magjob_core::{NewShift, NewShiftEditRequest, Page, PageRequest, Shift, ShiftEditRequest};
use uuid::Uuid;

use super::{order_by, total, Database, SortColumns};
use crate::db::models::{ShiftEditRequestRow, ShiftRow};
use crate::db::repository::{RepoResult, ShiftRepository};

const SHIFT_SORT: SortColumns = &[("id", "id"), ("startTime", "start_time"), ("endTime", "end_time")];
const EDIT_REQUEST_SORT: SortColumns = &[("id", "id"), ("status", "status"), ("startTime", "start_time")];

#[async_trait]
impl ShiftRepository for Database {
    async fn insert_shift(&self, shift: NewShift) -> RepoResult<Shift> {
        let row = sqlx::query_as::<_, ShiftRow>(
            r#"INSERT INTO shifts (start_time, end_time, description, member_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, start_time, end_time, description, member_id"#,
        )
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(&shift.description)
        .bind(shift.member_id)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }

    async fn find_shift(&self, id: i64) -> RepoResult<Option<Shift>> {
        let row = sqlx::query_as::<_, ShiftRow>(
            "SELECT id, start_time, end_time, description, member_id FROM shifts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_shift(&self, shift: &Shift) -> RepoResult<()> {
        sqlx::query(
            "UPDATE shifts SET start_time = $2, end_time = $3, description = $4, member_id = $5 WHERE id = $1",
        )
        .bind(shift.id)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(&shift.description)
        .bind(shift.member_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_shift(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM shifts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_shifts_by_member(&self, member_id: Uuid, page: &PageRequest) -> RepoResult<Page<Shift>> {
        let sql = format!(
            r#"SELECT id, start_time, end_time, description, member_id
               FROM shifts WHERE member_id = $1
               {} LIMIT $2 OFFSET $3"#,
            order_by(page, SHIFT_SORT)?
        );
        let rows = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(member_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE member_id = $1")
            .bind(member_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }

    async fn insert_edit_request(&self, request: NewShiftEditRequest) -> RepoResult<ShiftEditRequest> {
        let row = sqlx::query_as::<_, ShiftEditRequestRow>(
            r#"INSERT INTO shift_edit_requests (status, start_time, end_time, shift_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, status, start_time, end_time, shift_id"#,
        )
        .bind(request.status.as_str())
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.shift_id)
        .fetch_one(self.pool())
        .await?;
        ShiftEditRequest::try_from(row)
    }

    async fn find_edit_request(&self, id: i64) -> RepoResult<Option<ShiftEditRequest>> {
        let row = sqlx::query_as::<_, ShiftEditRequestRow>(
            "SELECT id, status, start_time, end_time, shift_id FROM shift_edit_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(ShiftEditRequest::try_from).transpose()
    }

    async fn list_edit_requests_by_shift(
        &self,
        shift_id: i64,
        page: &PageRequest,
    ) -> RepoResult<Page<ShiftEditRequest>> {
        let sql = format!(
            r#"SELECT id, status, start_time, end_time, shift_id
               FROM shift_edit_requests WHERE shift_id = $1
               {} LIMIT $2 OFFSET $3"#,
            order_by(page, EDIT_REQUEST_SORT)?
        );
        let rows = sqlx::query_as::<_, ShiftEditRequestRow>(&sql)
            .bind(shift_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shift_edit_requests WHERE shift_id = $1")
            .bind(shift_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(ShiftEditRequest::try_from)
                .collect::<RepoResult<Vec<_>>>()?,
            total: total(count),
        })
    }

    async fn save_edit_request(
        &self,
        request: &ShiftEditRequest,
        shift: Option<&Shift>,
    ) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            "UPDATE shift_edit_requests SET status = $2, start_time = $3, end_time = $4 WHERE id = $1",
        )
        .bind(request.id)
        .bind(request.status.as_str())
        .bind(request.start_time)
        .bind(request.end_time)
        .execute(&mut *tx)
        .await?;
        if let Some(shift) = shift {
            sqlx::query("UPDATE shifts SET start_time = $2, end_time = $3 WHERE id = $1")
                .bind(shift.id)
                .bind(shift.start_time)
                .bind(shift.end_time)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_edit_request(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM shift_edit_requests WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
