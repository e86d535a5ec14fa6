use async_trait::async_trait;
use magjob_core::{Notification, NotificationFilter, Page, PageRequest};
use uuid::Uuid;

use super::{order_by, total, Database, SortColumns};
use crate::db::models::NotificationRow;
use crate::db::repository::{NotificationRepository, RepoResult};

const NOTIFICATION_SORT: SortColumns = &[
    ("id", "id"),
    ("dateOfCreation", "date_of_creation"),
    ("seen", "seen"),
    ("sent", "sent"),
];

const FILTER: &str = r#"($1::UUID IS NULL OR user_id = $1)
    AND ($2::UUID IS NULL OR member_id = $2)
    AND ($3::UUID IS NULL OR organization_id = $3)
    AND ($4::BOOLEAN IS NULL OR seen = $4)
    AND ($5::BOOLEAN IS NULL OR sent = $5)"#;

#[async_trait]
impl NotificationRepository for Database {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> RepoResult<Page<Notification>> {
        let target = filter.target;
        let user_id = target.and_then(|t| t.user_id());
        let member_id = target.and_then(|t| t.member_id());
        let organization_id = target.and_then(|t| t.organization_id());

        let sql = format!(
            r#"SELECT id, content, date_of_creation, seen, sent, user_id, member_id, organization_id
               FROM notifications WHERE {} {} LIMIT $6 OFFSET $7"#,
            FILTER,
            order_by(page, NOTIFICATION_SORT)?
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(user_id)
            .bind(member_id)
            .bind(organization_id)
            .bind(filter.seen)
            .bind(filter.sent)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications WHERE {}", FILTER))
            .bind(user_id)
            .bind(member_id)
            .bind(organization_id)
            .bind(filter.seen)
            .bind(filter.sent)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(Notification::try_from)
                .collect::<RepoResult<Vec<_>>>()?,
            total: total(count),
        })
    }

    async fn find_notification(&self, id: Uuid) -> RepoResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"SELECT id, content, date_of_creation, seen, sent, user_id, member_id, organization_id
               FROM notifications WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Notification::try_from).transpose()
    }

    async fn insert_notification(&self, notification: &Notification) -> RepoResult<()> {
        let target = notification.target;
        sqlx::query(
            r#"INSERT INTO notifications
               (id, content, date_of_creation, seen, sent, user_id, member_id, organization_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(notification.id)
        .bind(&notification.content)
        .bind(notification.date_of_creation)
        .bind(notification.seen)
        .bind(notification.sent)
        .bind(target.user_id())
        .bind(target.member_id())
        .bind(target.organization_id())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update_notification(&self, notification: &Notification) -> RepoResult<()> {
        sqlx::query("UPDATE notifications SET content = $2, seen = $3, sent = $4 WHERE id = $1")
            .bind(notification.id)
            .bind(&notification.content)
            .bind(notification.seen)
            .bind(notification.sent)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn delete_notification(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
