//! In-memory implementation of every repository trait.
//!
//! Used by the `STORAGE=memory` mode and by tests. Cascade rules match the
//! PostgreSQL schema: deleting a parent removes its owned children.

use async_trait::async_trait;
use magjob_core::{
    AvailabilityTemplate, Chat, ChatMember, ChatMessage, Graphic, NewShift, NewShiftEditRequest,
    Notification, NotificationFilter, Page, PageRequest, Shift, ShiftEditRequest, TimeEntry,
    TimeEntryMember,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{
    CalendarRepository, ChatRepository, NotificationRepository, RepoResult, ShiftRepository,
};
use crate::error::AppError;

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Tables>>,
}

struct Tables {
    templates: HashMap<Uuid, AvailabilityTemplate>,
    graphics: HashMap<Uuid, Graphic>,
    time_entries: Vec<TimeEntry>,
    time_entry_members: Vec<TimeEntryMember>,

    shifts: BTreeMap<i64, Shift>,
    edit_requests: BTreeMap<i64, ShiftEditRequest>,
    next_shift_id: i64,
    next_edit_request_id: i64,

    chats: HashMap<Uuid, Chat>,
    chat_members: Vec<ChatMember>,
    messages: Vec<ChatMessage>,

    notifications: Vec<Notification>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            templates: HashMap::new(),
            graphics: HashMap::new(),
            time_entries: Vec::new(),
            time_entry_members: Vec::new(),
            shifts: BTreeMap::new(),
            edit_requests: BTreeMap::new(),
            next_shift_id: 1,
            next_edit_request_id: 1,
            chats: HashMap::new(),
            chat_members: Vec::new(),
            messages: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl Tables {
    /// A graphic with its children, entries in insertion order.
    fn assemble_graphic(&self, graphic: &Graphic) -> Graphic {
        let mut graphic = graphic.clone();
        graphic.time_entries = self
            .time_entries
            .iter()
            .filter(|e| e.graphic_id == Some(graphic.id))
            .cloned()
            .collect();
        graphic.time_entry_members = self
            .time_entry_members
            .iter()
            .filter(|m| m.graphic_id == Some(graphic.id))
            .cloned()
            .collect();
        graphic
    }

    fn graphics_where(&self, keep: impl Fn(&Graphic) -> bool) -> Vec<Graphic> {
        self.graphics
            .values()
            .map(|g| self.assemble_graphic(g))
            .filter(|g| keep(g))
            .collect()
    }
}

fn replace<T: Clone>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool) -> RepoResult<()> {
    match rows.iter_mut().find(|r| same(r)) {
        Some(existing) => {
            *existing = row.clone();
            Ok(())
        }
        None => Err(AppError::Internal("row vanished during update".to_string())),
    }
}

fn remove<T>(rows: &mut Vec<T>, same: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|r| !same(r));
    rows.len() != before
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CalendarRepository for MemoryStore {
    async fn list_templates(&self, page: &PageRequest) -> RepoResult<Page<AvailabilityTemplate>> {
        let data = self.data.read().await;
        Ok(page.apply(data.templates.values().cloned().collect())?)
    }

    async fn list_templates_by_organization(
        &self,
        organization_id: i64,
        page: &PageRequest,
    ) -> RepoResult<Page<AvailabilityTemplate>> {
        let data = self.data.read().await;
        let rows = data
            .templates
            .values()
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn find_template(&self, id: Uuid) -> RepoResult<Option<AvailabilityTemplate>> {
        Ok(self.data.read().await.templates.get(&id).cloned())
    }

    async fn insert_template(&self, template: &AvailabilityTemplate) -> RepoResult<()> {
        let mut data = self.data.write().await;
        data.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn save_template(&self, template: &AvailabilityTemplate) -> RepoResult<()> {
        self.insert_template(template).await
    }

    async fn delete_template(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.data.write().await.templates.remove(&id).is_some())
    }

    async fn list_graphics(&self, page: &PageRequest) -> RepoResult<Page<Graphic>> {
        let data = self.data.read().await;
        Ok(page.apply(data.graphics_where(|_| true))?)
    }

    async fn list_graphics_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<Graphic>> {
        let data = self.data.read().await;
        Ok(page.apply(data.graphics_where(|g| g.has_member(member_id)))?)
    }

    async fn find_graphic(&self, id: Uuid) -> RepoResult<Option<Graphic>> {
        let data = self.data.read().await;
        Ok(data.graphics.get(&id).map(|g| data.assemble_graphic(g)))
    }

    async fn insert_graphic(&self, graphic: &Graphic) -> RepoResult<()> {
        let mut data = self.data.write().await;
        let mut row = graphic.clone();
        row.time_entries.clear();
        row.time_entry_members.clear();
        data.graphics.insert(row.id, row);
        data.time_entries.extend(graphic.time_entries.iter().cloned());
        data.time_entry_members
            .extend(graphic.time_entry_members.iter().cloned());
        Ok(())
    }

    async fn update_graphic(&self, graphic: &Graphic) -> RepoResult<()> {
        let mut data = self.data.write().await;
        let row = data
            .graphics
            .get_mut(&graphic.id)
            .ok_or_else(|| AppError::not_found("Graphic", graphic.id))?;
        row.name = graphic.name.clone();
        row.manager_id = graphic.manager_id;
        Ok(())
    }

    async fn append_to_graphic(
        &self,
        graphic_id: Uuid,
        entries: &[TimeEntry],
        members: &[TimeEntryMember],
    ) -> RepoResult<()> {
        let mut data = self.data.write().await;
        if !data.graphics.contains_key(&graphic_id) {
            return Err(AppError::not_found("Graphic", graphic_id));
        }
        data.time_entries.extend(entries.iter().cloned());
        data.time_entry_members.extend(members.iter().cloned());
        Ok(())
    }

    async fn delete_graphic(&self, id: Uuid) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        if data.graphics.remove(&id).is_none() {
            return Ok(false);
        }
        let removed_entries: Vec<Uuid> = data
            .time_entries
            .iter()
            .filter(|e| e.graphic_id == Some(id))
            .map(|e| e.id)
            .collect();
        data.time_entries.retain(|e| e.graphic_id != Some(id));
        data.time_entry_members.retain(|m| {
            m.graphic_id != Some(id)
                && m.time_entry_id.map_or(true, |entry| !removed_entries.contains(&entry))
        });
        Ok(true)
    }

    async fn find_time_entry(&self, id: Uuid) -> RepoResult<Option<TimeEntry>> {
        let data = self.data.read().await;
        Ok(data.time_entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list_time_entries_by_graphic(
        &self,
        graphic_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntry>> {
        let data = self.data.read().await;
        let rows = data
            .time_entries
            .iter()
            .filter(|e| e.graphic_id == Some(graphic_id))
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn insert_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        self.data.write().await.time_entries.push(entry.clone());
        Ok(())
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> RepoResult<()> {
        let mut data = self.data.write().await;
        replace(&mut data.time_entries, entry, |e| e.id == entry.id)
    }

    async fn delete_time_entry(&self, id: Uuid) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        let removed = remove(&mut data.time_entries, |e| e.id == id);
        if removed {
            data.time_entry_members
                .retain(|m| m.time_entry_id != Some(id));
        }
        Ok(removed)
    }

    async fn list_time_entry_members(&self, page: &PageRequest) -> RepoResult<Page<TimeEntryMember>> {
        let data = self.data.read().await;
        Ok(page.apply(data.time_entry_members.clone())?)
    }

    async fn list_time_entry_members_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<TimeEntryMember>> {
        let data = self.data.read().await;
        let rows = data
            .time_entry_members
            .iter()
            .filter(|m| m.member_id == member_id)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn find_time_entry_member(&self, id: Uuid) -> RepoResult<Option<TimeEntryMember>> {
        let data = self.data.read().await;
        Ok(data.time_entry_members.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_time_entry_member(&self, member: &TimeEntryMember) -> RepoResult<()> {
        self.data.write().await.time_entry_members.push(member.clone());
        Ok(())
    }

    async fn update_time_entry_member(&self, member: &TimeEntryMember) -> RepoResult<()> {
        let mut data = self.data.write().await;
        replace(&mut data.time_entry_members, member, |m| m.id == member.id)
    }

    async fn delete_time_entry_member(&self, id: Uuid) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        Ok(remove(&mut data.time_entry_members, |m| m.id == id))
    }
}

#[async_trait]
impl ShiftRepository for MemoryStore {
    async fn insert_shift(&self, shift: NewShift) -> RepoResult<Shift> {
        let mut data = self.data.write().await;
        let id = data.next_shift_id;
        data.next_shift_id += 1;
        let shift = shift.with_id(id);
        data.shifts.insert(id, shift.clone());
        Ok(shift)
    }

    async fn find_shift(&self, id: i64) -> RepoResult<Option<Shift>> {
        Ok(self.data.read().await.shifts.get(&id).cloned())
    }

    async fn update_shift(&self, shift: &Shift) -> RepoResult<()> {
        let mut data = self.data.write().await;
        match data.shifts.get_mut(&shift.id) {
            Some(row) => {
                *row = shift.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Shift", shift.id)),
        }
    }

    async fn delete_shift(&self, id: i64) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        if data.shifts.remove(&id).is_none() {
            return Ok(false);
        }
        data.edit_requests.retain(|_, r| r.shift_id != id);
        Ok(true)
    }

    async fn list_shifts_by_member(&self, member_id: Uuid, page: &PageRequest) -> RepoResult<Page<Shift>> {
        let data = self.data.read().await;
        let rows = data
            .shifts
            .values()
            .filter(|s| s.member_id == Some(member_id))
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn insert_edit_request(&self, request: NewShiftEditRequest) -> RepoResult<ShiftEditRequest> {
        let mut data = self.data.write().await;
        if !data.shifts.contains_key(&request.shift_id) {
            return Err(AppError::not_found("Shift", request.shift_id));
        }
        let id = data.next_edit_request_id;
        data.next_edit_request_id += 1;
        let request = request.with_id(id);
        data.edit_requests.insert(id, request.clone());
        Ok(request)
    }

    async fn find_edit_request(&self, id: i64) -> RepoResult<Option<ShiftEditRequest>> {
        Ok(self.data.read().await.edit_requests.get(&id).cloned())
    }

    async fn list_edit_requests_by_shift(
        &self,
        shift_id: i64,
        page: &PageRequest,
    ) -> RepoResult<Page<ShiftEditRequest>> {
        let data = self.data.read().await;
        let rows = data
            .edit_requests
            .values()
            .filter(|r| r.shift_id == shift_id)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn save_edit_request(
        &self,
        request: &ShiftEditRequest,
        shift: Option<&Shift>,
    ) -> RepoResult<()> {
        let mut data = self.data.write().await;
        if !data.edit_requests.contains_key(&request.id) {
            return Err(AppError::not_found("Shift edit request", request.id));
        }
        if let Some(shift) = shift {
            if !data.shifts.contains_key(&shift.id) {
                return Err(AppError::not_found("Shift", shift.id));
            }
            data.shifts.insert(shift.id, shift.clone());
        }
        data.edit_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn delete_edit_request(&self, id: i64) -> RepoResult<bool> {
        Ok(self.data.write().await.edit_requests.remove(&id).is_some())
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn list_chats(&self, page: &PageRequest) -> RepoResult<Page<Chat>> {
        let data = self.data.read().await;
        Ok(page.apply(data.chats.values().cloned().collect())?)
    }

    async fn list_chats_by_organization(
        &self,
        organization_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<Chat>> {
        let data = self.data.read().await;
        let rows = data
            .chats
            .values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn list_chats_by_member(&self, member_id: Uuid, page: &PageRequest) -> RepoResult<Page<Chat>> {
        let data = self.data.read().await;
        let rows = data
            .chats
            .values()
            .filter(|c| {
                data.chat_members.iter().any(|m| {
                    m.chat_id == c.id && m.member_id == member_id && m.is_invitation_accepted
                })
            })
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn find_chat(&self, id: Uuid) -> RepoResult<Option<Chat>> {
        Ok(self.data.read().await.chats.get(&id).cloned())
    }

    async fn insert_chat(&self, chat: &Chat, owner: &ChatMember) -> RepoResult<()> {
        let mut data = self.data.write().await;
        data.chats.insert(chat.id, chat.clone());
        data.chat_members.push(owner.clone());
        Ok(())
    }

    async fn update_chat(&self, chat: &Chat) -> RepoResult<()> {
        let mut data = self.data.write().await;
        match data.chats.get_mut(&chat.id) {
            Some(row) => {
                *row = chat.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Chat", chat.id)),
        }
    }

    async fn delete_chat(&self, id: Uuid) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        if data.chats.remove(&id).is_none() {
            return Ok(false);
        }
        data.chat_members.retain(|m| m.chat_id != id);
        data.messages.retain(|m| m.chat_id != id);
        Ok(true)
    }

    async fn find_chat_member(&self, id: Uuid) -> RepoResult<Option<ChatMember>> {
        let data = self.data.read().await;
        Ok(data.chat_members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_chat_member_in_chat(
        &self,
        chat_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<ChatMember>> {
        let data = self.data.read().await;
        Ok(data
            .chat_members
            .iter()
            .find(|m| m.chat_id == chat_id && m.member_id == member_id)
            .cloned())
    }

    async fn list_chat_members_by_chat(
        &self,
        chat_id: Uuid,
        accepted: bool,
        page: &PageRequest,
    ) -> RepoResult<Page<ChatMember>> {
        let data = self.data.read().await;
        let rows = data
            .chat_members
            .iter()
            .filter(|m| m.chat_id == chat_id && m.is_invitation_accepted == accepted)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn list_chat_members_by_member(
        &self,
        member_id: Uuid,
        page: &PageRequest,
    ) -> RepoResult<Page<ChatMember>> {
        let data = self.data.read().await;
        let rows = data
            .chat_members
            .iter()
            .filter(|m| m.member_id == member_id)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn insert_chat_member(&self, member: &ChatMember) -> RepoResult<()> {
        self.data.write().await.chat_members.push(member.clone());
        Ok(())
    }

    async fn update_chat_member(&self, member: &ChatMember) -> RepoResult<()> {
        let mut data = self.data.write().await;
        replace(&mut data.chat_members, member, |m| m.id == member.id)
    }

    async fn delete_chat_member(&self, id: Uuid) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        let removed = remove(&mut data.chat_members, |m| m.id == id);
        if removed {
            data.messages.retain(|m| m.chat_member_id != id);
        }
        Ok(removed)
    }

    async fn list_messages_by_chat(&self, chat_id: Uuid, page: &PageRequest) -> RepoResult<Page<ChatMessage>> {
        let data = self.data.read().await;
        let rows = data
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn find_message(&self, id: Uuid) -> RepoResult<Option<ChatMessage>> {
        let data = self.data.read().await;
        Ok(data.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_message(&self, message: &ChatMessage) -> RepoResult<()> {
        self.data.write().await.messages.push(message.clone());
        Ok(())
    }

    async fn update_message(&self, message: &ChatMessage) -> RepoResult<()> {
        let mut data = self.data.write().await;
        replace(&mut data.messages, message, |m| m.id == message.id)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_notifications(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> RepoResult<Page<Notification>> {
        let data = self.data.read().await;
        let rows = data
            .notifications
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect();
        Ok(page.apply(rows)?)
    }

    async fn find_notification(&self, id: Uuid) -> RepoResult<Option<Notification>> {
        let data = self.data.read().await;
        Ok(data.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn insert_notification(&self, notification: &Notification) -> RepoResult<()> {
        self.data.write().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn update_notification(&self, notification: &Notification) -> RepoResult<()> {
        let mut data = self.data.write().await;
        replace(&mut data.notifications, notification, |n| n.id == notification.id)
    }

    async fn delete_notification(&self, id: Uuid) -> RepoResult<bool> {
        let mut data = self.data.write().await;
        Ok(remove(&mut data.notifications, |n| n.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_graphic_entries_keep_insertion_order() {
        let store = MemoryStore::new();
        let mut graphic = Graphic::new("June", 7);
        let late = TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: at(3, 9),
            end_date_time: at(3, 17),
            graphic_id: None,
        };
        let early = TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: at(2, 9),
            end_date_time: at(2, 17),
            graphic_id: None,
        };
        graphic.attach_time_entries([late.clone(), early.clone()]);
        store.insert_graphic(&graphic).await.unwrap();

        let stored = store.find_graphic(graphic.id).await.unwrap().unwrap();
        let ids: Vec<Uuid> = stored.time_entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);

        let earliest = TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: at(1, 9),
            end_date_time: at(1, 17),
            graphic_id: Some(graphic.id),
        };
        store
            .append_to_graphic(graphic.id, &[earliest.clone()], &[])
            .await
            .unwrap();
        let stored = store.find_graphic(graphic.id).await.unwrap().unwrap();
        let ids: Vec<Uuid> = stored.time_entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![late.id, early.id, earliest.id]);
    }

    #[tokio::test]
    async fn test_append_to_missing_graphic_is_not_found() {
        let store = MemoryStore::new();
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: at(2, 9),
            end_date_time: at(2, 17),
            graphic_id: None,
        };
        let result = store.append_to_graphic(Uuid::new_v4(), &[entry.clone()], &[]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(store.find_time_entry(entry.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deleting_graphic_cascades() {
        let store = MemoryStore::new();
        let mut graphic = Graphic::new("June", 7);
        graphic.attach_time_entries([TimeEntry {
            id: Uuid::new_v4(),
            start_date_time: at(2, 9),
            end_date_time: at(2, 17),
            graphic_id: None,
        }]);
        graphic.attach_members([TimeEntryMember {
            id: Uuid::new_v4(),
            status: "assigned".to_string(),
            member_id: Uuid::new_v4(),
            time_entry_id: None,
            graphic_id: None,
        }]);
        store.insert_graphic(&graphic).await.unwrap();

        assert!(store.delete_graphic(graphic.id).await.unwrap());
        let entry_id = graphic.time_entries[0].id;
        assert_eq!(store.find_time_entry(entry_id).await.unwrap(), None);
        let members = store
            .list_time_entry_members(&PageRequest::default())
            .await
            .unwrap();
        assert_eq!(members.total, 0);
        assert!(!store.delete_graphic(graphic.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_shift_ids_are_sequential_and_delete_cascades() {
        let store = MemoryStore::new();
        let first = store
            .insert_shift(NewShift::start("Morning", None, at(2, 8)))
            .await
            .unwrap();
        let second = store
            .insert_shift(NewShift::start("Evening", None, at(2, 16)))
            .await
            .unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let request = store
            .insert_edit_request(NewShiftEditRequest {
                status: Default::default(),
                start_time: at(2, 7),
                end_time: at(2, 15),
                shift_id: first.id,
            })
            .await
            .unwrap();
        assert!(store.delete_shift(first.id).await.unwrap());
        assert_eq!(store.find_edit_request(request.id).await.unwrap(), None);
    }
}
