use magjob_core::{Clock, Notification, NotificationFilter, NotificationTarget, Page, PageRequest};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::NotificationRepository;
use crate::error::AppError;
use crate::realtime::Hub;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub content: String,
    pub user_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    hub: Arc<Hub>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>, hub: Arc<Hub>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifications,
            hub,
            clock,
        }
    }

    pub async fn list(
        &self,
        seen: Option<bool>,
        sent: Option<bool>,
        page: &PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let filter = NotificationFilter {
            target: None,
            seen,
            sent,
        };
        self.notifications.list_notifications(&filter, page).await
    }

    pub async fn list_by_target(
        &self,
        target: NotificationTarget,
        seen: Option<bool>,
        page: &PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let filter = NotificationFilter {
            target: Some(target),
            seen,
            sent: None,
        };
        self.notifications.list_notifications(&filter, page).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Notification, AppError> {
        self.notifications
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification", id))
    }

    /// Stores the notification and pushes it to its target's topic.
    pub async fn create(&self, request: NewNotification) -> Result<Notification, AppError> {
        let target =
            NotificationTarget::from_fields(request.user_id, request.member_id, request.organization_id)?;
        let notification = Notification::new(request.content, target, self.clock.now());
        self.notifications.insert_notification(&notification).await?;

        let delivered = self.hub.publish_json(&target.topic(), &notification).await?;
        tracing::debug!(
            "Notification {} pushed to {} ({} subscribers)",
            notification.id,
            target.topic(),
            delivered
        );
        Ok(notification)
    }

    pub async fn mark_seen(&self, id: Uuid) -> Result<Notification, AppError> {
        let mut notification = self.find(id).await?;
        notification.seen = true;
        self.notifications.update_notification(&notification).await?;
        Ok(notification)
    }

    pub async fn mark_sent(&self, id: Uuid) -> Result<Notification, AppError> {
        let mut notification = self.find(id).await?;
        notification.sent = true;
        self.notifications.update_notification(&notification).await?;
        Ok(notification)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.notifications.delete_notification(id).await? {
            return Err(AppError::not_found("Notification", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::NaiveDate;
    use magjob_core::FixedClock;

    fn service() -> (NotificationService, Arc<Hub>) {
        let hub = Arc::new(Hub::new());
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        ));
        (
            NotificationService::new(Arc::new(MemoryStore::new()), hub.clone(), clock),
            hub,
        )
    }

    fn to_user(user: Uuid) -> NewNotification {
        NewNotification {
            content: "Shift board published".to_string(),
            user_id: Some(user),
            member_id: None,
            organization_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_publishes_to_target_topic() {
        let (service, hub) = service();
        let user = Uuid::new_v4();
        let mut inbox = hub.subscribe(&format!("notifications/users/{}", user)).await;

        let created = service.create(to_user(user)).await.unwrap();
        assert!(!created.seen);
        assert!(!created.sent);
        assert_eq!(created.date_of_creation.to_string(), "2025-06-02 10:30:00");

        let pushed: serde_json::Value = serde_json::from_str(&inbox.recv().await.unwrap()).unwrap();
        assert_eq!(pushed["id"], created.id.to_string());
        assert_eq!(pushed["userId"], user.to_string());
    }

    #[tokio::test]
    async fn test_target_rules() {
        let (service, _) = service();
        let mut two = to_user(Uuid::new_v4());
        two.organization_id = Some(Uuid::new_v4());
        assert!(matches!(service.create(two).await, Err(AppError::BadRequest(_))));

        let none = NewNotification {
            content: "nobody".to_string(),
            user_id: None,
            member_id: None,
            organization_id: None,
        };
        assert!(matches!(service.create(none).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_seen_filter() {
        let (service, _) = service();
        let user = Uuid::new_v4();
        let first = service.create(to_user(user)).await.unwrap();
        service.create(to_user(user)).await.unwrap();
        service.mark_seen(first.id).await.unwrap();

        let unseen = service
            .list_by_target(NotificationTarget::User(user), Some(false), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(unseen.total, 1);

        let seen = service.list(Some(true), None, &PageRequest::default()).await.unwrap();
        assert_eq!(seen.items[0].id, first.id);

        let sent = service.mark_sent(first.id).await.unwrap();
        assert!(sent.sent && sent.seen);
        service.delete(first.id).await.unwrap();
        assert!(matches!(service.delete(first.id).await, Err(AppError::NotFound(_))));
    }
}
