use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::page::{SortKey, Sortable};

pub const DEFAULT_OWNER_NICKNAME: &str = "Admin";

/// Topic name that chat traffic for `chat_id` is published on.
pub fn chat_topic(chat_id: Uuid) -> String {
    format!("chat/{}", chat_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub organization_id: Uuid,
    pub date_of_creation: NaiveDate,
}

impl Sortable for Chat {
    const SORT_FIELDS: &'static [&'static str] = &["id", "title", "dateOfCreation"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "title" => Some(SortKey::Text(self.title.clone())),
            "dateOfCreation" => Some(SortKey::Date(self.date_of_creation)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMember {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub member_id: Uuid,
    pub nickname: String,
    pub is_invitation_accepted: bool,
    pub is_admin: bool,
}

impl ChatMember {
    /// A pending invitation.
    pub fn invite(chat_id: Uuid, member_id: Uuid, nickname: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id,
            member_id,
            nickname: nickname.into(),
            is_invitation_accepted: false,
            is_admin: false,
        }
    }

    /// The member that created the chat: accepted and administrating.
    pub fn owner(chat_id: Uuid, member_id: Uuid, nickname: impl Into<String>) -> Self {
        Self {
            is_invitation_accepted: true,
            is_admin: true,
            ..Self::invite(chat_id, member_id, nickname)
        }
    }

    /// Whether this member may post into `chat_id`.
    pub fn can_post_in(&self, chat_id: Uuid) -> bool {
        self.chat_id == chat_id && self.is_invitation_accepted
    }
}

impl Sortable for ChatMember {
    const SORT_FIELDS: &'static [&'static str] = &["id", "nickname", "memberId"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "nickname" => Some(SortKey::Text(self.nickname.clone())),
            "memberId" => Some(SortKey::Id(self.member_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub chat_member_id: Uuid,
    pub content: String,
    pub attachment: Option<String>,
    pub viewed_by: Vec<String>,
    pub first_and_last_name: Option<String>,
    pub sent_at: NaiveDateTime,
}

impl ChatMessage {
    /// Records `viewer`; returns false when it was already recorded.
    pub fn mark_viewed_by(&mut self, viewer: &str) -> bool {
        if self.viewed_by.iter().any(|v| v == viewer) {
            return false;
        }
        self.viewed_by.push(viewer.to_string());
        true
    }

    pub fn date_of_creation(&self) -> NaiveDate {
        self.sent_at.date()
    }
}

impl Sortable for ChatMessage {
    const SORT_FIELDS: &'static [&'static str] = &["id", "sentAt", "dateOfCreation"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "sentAt" | "dateOfCreation" => Some(SortKey::DateTime(self.sent_at)),
            _ => None,
        }
    }
}

/// Events pushed to everyone subscribed to a chat topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChatEvent {
    Message { message: ChatMessage },
    Viewed { message_id: Uuid, viewer: String },
    Joined { nickname: String },
    Left { nickname: String },
    AdminGranted { nickname: String },
    AdminRevoked { nickname: String },
}

impl ChatEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            chat_member_id: Uuid::new_v4(),
            content: "hello".to_string(),
            attachment: None,
            viewed_by: vec![],
            first_and_last_name: None,
            sent_at: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_owner_is_accepted_admin() {
        let chat_id = Uuid::new_v4();
        let owner = ChatMember::owner(chat_id, Uuid::new_v4(), "Boss");
        assert!(owner.is_admin);
        assert!(owner.can_post_in(chat_id));
        assert!(!owner.can_post_in(Uuid::new_v4()));

        let invited = ChatMember::invite(chat_id, Uuid::new_v4(), "New");
        assert!(!invited.can_post_in(chat_id));
    }

    #[test]
    fn test_mark_viewed_is_idempotent() {
        let mut message = message();
        assert!(message.mark_viewed_by("anna"));
        assert!(!message.mark_viewed_by("anna"));
        assert!(message.mark_viewed_by("piotr"));
        assert_eq!(message.viewed_by, vec!["anna", "piotr"]);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = ChatEvent::Joined {
            nickname: "anna".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "joined");
        assert_eq!(json["nickname"], "anna");

        let viewed = ChatEvent::Viewed {
            message_id: Uuid::nil(),
            viewer: "anna".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&viewed.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "viewed");
        assert_eq!(json["messageId"], Uuid::nil().to_string());
    }

    #[test]
    fn test_chat_topic() {
        let id = Uuid::nil();
        assert_eq!(chat_topic(id), format!("chat/{}", id));
    }
}
