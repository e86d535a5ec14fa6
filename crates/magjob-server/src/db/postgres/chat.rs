use async_trait::async_trait;
use magjob_core::{Chat, ChatMember, ChatMessage, Page, PageRequest};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{order_by, total, Database, SortColumns};
use crate::db::models::{ChatMemberRow, ChatMessageRow, ChatRow};
use crate::db::repository::{ChatRepository, RepoResult};

const CHAT_SORT: SortColumns = &[
    ("id", "id"),
    ("title", "title"),
    ("dateOfCreation", "date_of_creation"),
];
const CHAT_MEMBER_SORT: SortColumns = &[("id", "id"), ("nickname", "nickname"), ("memberId", "member_id")];
const MESSAGE_SORT: SortColumns = &[("id", "id"), ("sentAt", "sent_at"), ("dateOfCreation", "sent_at")];

const CHAT_COLUMNS: &str = "id, title, organization_id, date_of_creation";
const MEMBER_COLUMNS: &str = "id, chat_id, member_id, nickname, is_invitation_accepted, is_admin";
const MESSAGE_COLUMNS: &str =
    "id, chat_id, chat_member_id, content, attachment, viewed_by, first_and_last_name, sent_at";

async fn insert_member(tx: &mut Transaction<'_, Postgres>, member: &ChatMember) -> RepoResult<()> {
    sqlx::query(
        r#"INSERT INTO chat_members (id, chat_id, member_id, nickname, is_invitation_accepted, is_admin)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(member.id)
    .bind(member.chat_id)
    .bind(member.member_id)
    .bind(&member.nickname)
    .bind(member.is_invitation_accepted)
    .bind(member.is_admin)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl Database {
    /// Chats matching an optional organization and an optional accepted member.
    async fn chats_page(
        &self,
        organization_id: Option<Uuid>,
        member_id: Option<Uuid>,
        page: &PageRequest,
    ) -> RepoResult<Page<Chat>> {
        const FILTER: &str = r#"($1::UUID IS NULL OR organization_id = $1)
            AND ($2::UUID IS NULL OR EXISTS (
                SELECT 1 FROM chat_members m
                WHERE m.chat_id = chats.id AND m.member_id = $2 AND m.is_invitation_accepted))"#;
        let sql = format!(
            "SELECT {} FROM chats WHERE {} {} LIMIT $3 OFFSET $4",
            CHAT_COLUMNS,
            FILTER,
            order_by(page, CHAT_SORT)?
        );
        let rows = sqlx::query_as::<_, ChatRow>(&sql)
            .bind(organization_id)
            .bind(member_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM chats WHERE {}", FILTER))
            .bind(organization_id)
            .bind(member_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }
}

#[async_trait]
impl ChatRepository for Database {
    async fn list_chats(&self, page: &PageRequest) -> RepoResult<Page<Chat>> {
        self.chats_page(None, None, page).await
    }

    async fn list_chats_by_organization(
        &self,
        organization_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<Chat>> {
        self.chats_page(Some(organization_id), None, page).await
    }

    async fn list_chats_by_member(&self, member_id: Uuid, page: &PageRequest) -> RepoResult<Page<Chat>> {
        self.chats_page(None, Some(member_id), page).await
    }

    async fn find_chat(&self, id: Uuid) -> RepoResult<Option<Chat>> {
        let row = sqlx::query_as::<_, ChatRow>(&format!("SELECT {} FROM chats WHERE id = $1", CHAT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_chat(&self, chat: &Chat, owner: &ChatMember) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("INSERT INTO chats (id, title, organization_id, date_of_creation) VALUES ($1, $2, $3, $4)")
            .bind(chat.id)
            .bind(&chat.title)
            .bind(chat.organization_id)
            .bind(chat.date_of_creation)
            .execute(&mut *tx)
            .await?;
        insert_member(&mut tx, owner).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_chat(&self, chat: &Chat) -> RepoResult<()> {
        sqlx::query("UPDATE chats SET title = $2 WHERE id = $1")
            .bind(chat.id)
            .bind(&chat.title)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn delete_chat(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_chat_member(&self, id: Uuid) -> RepoResult<Option<ChatMember>> {
        let row = sqlx::query_as::<_, ChatMemberRow>(&format!(
            "SELECT {} FROM chat_members WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_chat_member_in_chat(
        &self,
        chat_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<ChatMember>> {
        let row = sqlx::query_as::<_, ChatMemberRow>(&format!(
            "SELECT {} FROM chat_members WHERE chat_id = $1 AND member_id = $2",
            MEMBER_COLUMNS
        ))
        .bind(chat_id)
        .bind(member_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_chat_members_by_chat(
        &self,
        chat_id: Uuid,
        accepted: bool,
        page: &PageRequest,
    ) -> RepoResult<Page<ChatMember>> {
        let sql = format!(
            "SELECT {} FROM chat_members WHERE chat_id = $1 AND is_invitation_accepted = $2 {} LIMIT $3 OFFSET $4",
            MEMBER_COLUMNS,
            order_by(page, CHAT_MEMBER_SORT)?
        );
        let rows = sqlx::query_as::<_, ChatMemberRow>(&sql)
            .bind(chat_id)
            .bind(accepted)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_members WHERE chat_id = $1 AND is_invitation_accepted = $2",
        )
        .bind(chat_id)
        .bind(accepted)
        .fetch_one(self.pool())
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }

    async fn list_chat_members_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<ChatMember>> {
        let sql = format!(
            "SELECT {} FROM chat_members WHERE member_id = $1 {} LIMIT $2 OFFSET $3",
            MEMBER_COLUMNS,
            order_by(page, CHAT_MEMBER_SORT)?
        );
        let rows = sqlx::query_as::<_, ChatMemberRow>(&sql)
            .bind(member_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_members WHERE member_id = $1")
            .bind(member_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }

    async fn insert_chat_member(&self, member: &ChatMember) -> RepoResult<()> {
        let mut tx = self.pool().begin().await?;
        insert_member(&mut tx, member).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_chat_member(&self, member: &ChatMember) -> RepoResult<()> {
        sqlx::query(
            "UPDATE chat_members SET nickname = $2, is_invitation_accepted = $3, is_admin = $4 WHERE id = $1",
        )
        .bind(member.id)
        .bind(&member.nickname)
        .bind(member.is_invitation_accepted)
        .bind(member.is_admin)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_chat_member(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM chat_members WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_messages_by_chat(&self, chat_id: Uuid, page: &PageRequest) -> RepoResult<Page<ChatMessage>> {
        let sql = format!(
            "SELECT {} FROM chat_messages WHERE chat_id = $1 {} LIMIT $2 OFFSET $3",
            MESSAGE_COLUMNS,
            order_by(page, MESSAGE_SORT)?
        );
        let rows = sqlx::query_as::<_, ChatMessageRow>(&sql)
            .bind(chat_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_one(self.pool())
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total(count),
        })
    }

    async fn find_message(&self, id: Uuid) -> RepoResult<Option<ChatMessage>> {
        let row = sqlx::query_as::<_, ChatMessageRow>(&format!(
            "SELECT {} FROM chat_messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_message(&self, message: &ChatMessage) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO chat_messages ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            MESSAGE_COLUMNS
        ))
        .bind(message.id)
        .bind(message.chat_id)
        .bind(message.chat_member_id)
        .bind(&message.content)
        .bind(&message.attachment)
        .bind(&message.viewed_by)
        .bind(&message.first_and_last_name)
        .bind(message.sent_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update_message(&self, message: &ChatMessage) -> RepoResult<()> {
        sqlx::query("UPDATE chat_messages SET content = $2, attachment = $3, viewed_by = $4 WHERE id = $1")
            .bind(message.id)
            .bind(&message.content)
            .bind(&message.attachment)
            .bind(&message.viewed_by)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
