use chrono::NaiveDateTime;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::page::{SortKey, Sortable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("a notification needs a user, member or organization target")]
    Missing,
    #[error("a notification can target only one of user, member or organization")]
    Ambiguous,
}

/// The single recipient scope of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTarget {
    User(Uuid),
    Member(Uuid),
    Organization(Uuid),
}

impl NotificationTarget {
    pub fn from_fields(
        user_id: Option<Uuid>,
        member_id: Option<Uuid>,
        organization_id: Option<Uuid>,
    ) -> Result<Self, TargetError> {
        match (user_id, member_id, organization_id) {
            (Some(id), None, None) => Ok(NotificationTarget::User(id)),
            (None, Some(id), None) => Ok(NotificationTarget::Member(id)),
            (None, None, Some(id)) => Ok(NotificationTarget::Organization(id)),
            (None, None, None) => Err(TargetError::Missing),
            _ => Err(TargetError::Ambiguous),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            NotificationTarget::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn member_id(&self) -> Option<Uuid> {
        match self {
            NotificationTarget::Member(id) => Some(*id),
            _ => None,
        }
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            NotificationTarget::Organization(id) => Some(*id),
            _ => None,
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            NotificationTarget::User(_) => "users",
            NotificationTarget::Member(_) => "members",
            NotificationTarget::Organization(_) => "organizations",
        }
    }

    /// Parses the `{scope}/{id}` pair used by the websocket route.
    pub fn from_scope(scope: &str, id: Uuid) -> Option<Self> {
        match scope {
            "users" => Some(NotificationTarget::User(id)),
            "members" => Some(NotificationTarget::Member(id)),
            "organizations" => Some(NotificationTarget::Organization(id)),
            _ => None,
        }
    }

    pub fn topic(&self) -> String {
        let id = match self {
            NotificationTarget::User(id)
            | NotificationTarget::Member(id)
            | NotificationTarget::Organization(id) => id,
        };
        format!("notifications/{}/{}", self.scope(), id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub content: String,
    pub date_of_creation: NaiveDateTime,
    pub seen: bool,
    pub sent: bool,
    pub target: NotificationTarget,
}

impl Notification {
    /// A fresh, unseen and unsent notification.
    pub fn new(content: impl Into<String>, target: NotificationTarget, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            date_of_creation: now,
            seen: false,
            sent: false,
            target,
        }
    }
}

/// Flattens the target into `userId`, `memberId` and `organizationId`.
impl Serialize for Notification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Notification", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("dateOfCreation", &self.date_of_creation)?;
        state.serialize_field("seen", &self.seen)?;
        state.serialize_field("sent", &self.sent)?;
        state.serialize_field("userId", &self.target.user_id())?;
        state.serialize_field("memberId", &self.target.member_id())?;
        state.serialize_field("organizationId", &self.target.organization_id())?;
        state.end()
    }
}

impl Sortable for Notification {
    const SORT_FIELDS: &'static [&'static str] = &["id", "dateOfCreation", "seen", "sent"];

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "id" => Some(SortKey::Id(self.id)),
            "dateOfCreation" => Some(SortKey::DateTime(self.date_of_creation)),
            "seen" => Some(SortKey::Bool(self.seen)),
            "sent" => Some(SortKey::Bool(self.sent)),
            _ => None,
        }
    }
}

/// Optional constraints for listing notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub target: Option<NotificationTarget>,
    pub seen: Option<bool>,
    pub sent: Option<bool>,
}

impl NotificationFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        self.target.map_or(true, |t| t == notification.target)
            && self.seen.map_or(true, |s| s == notification.seen)
            && self.sent.map_or(true, |s| s == notification.sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_single_target_required() {
        let id = Uuid::new_v4();
        assert_eq!(
            NotificationTarget::from_fields(None, Some(id), None),
            Ok(NotificationTarget::Member(id))
        );
        assert_eq!(
            NotificationTarget::from_fields(None, None, None),
            Err(TargetError::Missing)
        );
        assert_eq!(
            NotificationTarget::from_fields(Some(id), None, Some(id)),
            Err(TargetError::Ambiguous)
        );
    }

    #[test]
    fn test_topic_and_scope_round_trip() {
        let id = Uuid::new_v4();
        let target = NotificationTarget::Organization(id);
        assert_eq!(target.topic(), format!("notifications/organizations/{}", id));
        assert_eq!(NotificationTarget::from_scope("organizations", id), Some(target));
        assert_eq!(NotificationTarget::from_scope("teams", id), None);
    }

    #[test]
    fn test_new_notification_is_unseen_and_unsent() {
        let n = Notification::new("hi", NotificationTarget::User(Uuid::new_v4()), now());
        assert!(!n.seen);
        assert!(!n.sent);
        assert_eq!(n.date_of_creation, now());
    }

    #[test]
    fn test_serialized_target_is_flat() {
        let member = Uuid::new_v4();
        let n = Notification::new("hi", NotificationTarget::Member(member), now());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["memberId"], member.to_string());
        assert!(json["userId"].is_null());
        assert_eq!(json["seen"], false);
    }

    #[test]
    fn test_filter() {
        let user = Uuid::new_v4();
        let mut n = Notification::new("hi", NotificationTarget::User(user), now());
        n.seen = true;

        let by_user = NotificationFilter {
            target: Some(NotificationTarget::User(user)),
            ..Default::default()
        };
        assert!(by_user.matches(&n));

        let unseen = NotificationFilter {
            seen: Some(false),
            ..by_user
        };
        assert!(!unseen.matches(&n));

        let other = NotificationFilter {
            target: Some(NotificationTarget::Member(user)),
            ..Default::default()
        };
        assert!(!other.matches(&n));
    }
}
