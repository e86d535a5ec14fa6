//! Storage seams. Each trait is implemented by the PostgreSQL [`Database`]
//! and by the in-memory [`MemoryStore`].
//!
//! [`Database`]: super::Database
//! [`MemoryStore`]: super::MemoryStore

use async_trait::async_trait;
use magjob_core::{
    AvailabilityTemplate, Chat, ChatMember, ChatMessage, Graphic, NewShift, NewShiftEditRequest,
    Notification, NotificationFilter, Page, PageRequest, Shift, ShiftEditRequest, TimeEntry,
    TimeEntryMember,
};
use uuid::Uuid;

use crate::error::AppError;

pub type RepoResult<T> = Result<T, AppError>;

#[async_trait]
pub trait CalendarRepository: Send + Sync {
    async fn list_templates(&self, page: &PageRequest) -> RepoResult<Page<AvailabilityTemplate>>;
    async fn list_templates_by_organization(
        &self,
        organization_id: i64,
        page: &PageRequest,
    ) -> RepoResult<Page<AvailabilityTemplate>>;
    async fn find_template(&self, id: Uuid) -> RepoResult<Option<AvailabilityTemplate>>;
    /// Stores the template together with its entries.
    async fn insert_template(&self, template: &AvailabilityTemplate) -> RepoResult<()>;
    /// Overwrites the template row and replaces its entries.
    async fn save_template(&self, template: &AvailabilityTemplate) -> RepoResult<()>;
    async fn delete_template(&self, id: Uuid) -> RepoResult<bool>;

    async fn list_graphics(&self, page: &PageRequest) -> RepoResult<Page<Graphic>>;
    /// Graphics with a time entry member whose member id is `member_id`.
    async fn list_graphics_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<Graphic>>;
    async fn find_graphic(&self, id: Uuid) -> RepoResult<Option<Graphic>>;
    /// Stores the graphic with all of its entries and members.
    async fn insert_graphic(&self, graphic: &Graphic) -> RepoResult<()>;
    /// Updates name and manager only.
    async fn update_graphic(&self, graphic: &Graphic) -> RepoResult<()>;
    /// Adds entries and members to an existing graphic, after any it
    /// already has. NotFound when the graphic is absent.
    async fn append_to_graphic(
        &self,
        graphic_id: Uuid,
        entries: &[TimeEntry],
        members: &[TimeEntryMember],
    ) -> RepoResult<()>;
    async fn delete_graphic(&self, id: Uuid) -> RepoResult<bool>;

    async fn find_time_entry(&self, id: Uuid) -> RepoResult<Option<TimeEntry>>;
    async fn list_time_entries_by_graphic(
        &self,
        graphic_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntry>>;
    async fn insert_time_entry(&self, entry: &TimeEntry) -> RepoResult<()>;
    async fn update_time_entry(&self, entry: &TimeEntry) -> RepoResult<()>;
    async fn delete_time_entry(&self, id: Uuid) -> RepoResult<bool>;

    async fn list_time_entry_members(&self, page: &PageRequest) -> RepoResult<Page<TimeEntryMember>>;
    async fn list_time_entry_members_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntryMember>>;
    async fn find_time_entry_member(&self, id: Uuid) -> RepoResult<Option<TimeEntryMember>>;
    async fn insert_time_entry_member(&self, member: &TimeEntryMember) -> RepoResult<()>;
    async fn update_time_entry_member(&self, member: &TimeEntryMember) -> RepoResult<()>;
    async fn delete_time_entry_member(&self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait ShiftRepository: Send + Sync {
    async fn insert_shift(&self, shift: NewShift) -> RepoResult<Shift>;
    async fn find_shift(&self, id: i64) -> RepoResult<Option<Shift>>;
    async fn update_shift(&self, shift: &Shift) -> RepoResult<()>;
    /// Removes the shift and its edit requests.
    async fn delete_shift(&self, id: i64) -> RepoResult<bool>;
    async fn list_shifts_by_member(&self, member_id: Uuid, page: &PageRequest) -> RepoResult<Page<Shift>>;

    async fn insert_edit_request(&self, request: NewShiftEditRequest) -> RepoResult<ShiftEditRequest>;
    async fn find_edit_request(&self, id: i64) -> RepoResult<Option<ShiftEditRequest>>;
    async fn list_edit_requests_by_shift(
        &self,
        shift_id: i64,
        page: &PageRequest,
    ) -> RepoResult<Page<ShiftEditRequest>>;
    /// Writes the request and, when given, its shift atomically.
    async fn save_edit_request(
        &self,
        request: &ShiftEditRequest,
        shift: Option<&Shift>,
    ) -> RepoResult<()>;
    async fn delete_edit_request(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn list_chats(&self, page: &PageRequest) -> RepoResult<Page<Chat>>;
    async fn list_chats_by_organization(
        &self,
        organization_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<Chat>>;
    /// Chats in which `member_id` holds a chat membership.
    async fn list_chats_by_member(&self, member_id: Uuid, page: &PageRequest) -> RepoResult<Page<Chat>>;
    async fn find_chat(&self, id: Uuid) -> RepoResult<Option<Chat>>;
    /// Stores the chat and its creator's membership atomically.
    async fn insert_chat(&self, chat: &Chat, owner: &ChatMember) -> RepoResult<()>;
    async fn update_chat(&self, chat: &Chat) -> RepoResult<()>;
    /// Removes the chat with its members and messages.
    async fn delete_chat(&self, id: Uuid) -> RepoResult<bool>;

    async fn find_chat_member(&self, id: Uuid) -> RepoResult<Option<ChatMember>>;
    async fn find_chat_member_in_chat(
        &self,
        chat_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<ChatMember>>;
    async fn list_chat_members_by_chat(
        &self,
        chat_id: Uuid,
        accepted: bool,
        page: &PageRequest,
    ) -> RepoResult<Page<ChatMember>>;
    async fn list_chat_members_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<ChatMember>>;
    async fn insert_chat_member(&self, member: &ChatMember) -> RepoResult<()>;
    async fn update_chat_member(&self, member: &ChatMember) -> RepoResult<()>;
    async fn delete_chat_member(&self, id: Uuid) -> RepoResult<bool>;

    async fn list_messages_by_chat(&self, chat_id: Uuid, page: &PageRequest) -> RepoResult<Page<ChatMessage>>;
    async fn find_message(&self, id: Uuid) -> RepoResult<Option<ChatMessage>>;
    async fn insert_message(&self, message: &ChatMessage) -> RepoResult<()>;
    async fn update_message(&self, message: &ChatMessage) -> RepoResult<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> RepoResult<Page<Notification>>;
    async fn find_notification(&self, id: Uuid) -> RepoResult<Option<Notification>>;
    async fn insert_notification(&self, notification: &Notification) -> RepoResult<()>;
    async fn update_notification(&self, notification: &Notification) -> RepoResult<()>;
    async fn delete_notification(&self, id: Uuid) -> RepoResult<bool>;
}
