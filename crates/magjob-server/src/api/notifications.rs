use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use magjob_core::{Notification, NotificationTarget};
use serde::Deserialize;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::identity::Identity;
use crate::service::notification::NewNotification;
use crate::AppState;

/// Paging plus the read-state filters.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
    pub seen: Option<bool>,
    pub sent: Option<bool>,
}

impl NotificationQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ListResponse<Notification>>, AppError> {
    let page = state
        .services
        .notifications
        .list(query.seen, query.sent, &query.page_params().to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |n| n)))
}

async fn list_for_target(
    state: &AppState,
    target: NotificationTarget,
    query: &NotificationQuery,
) -> Result<Json<ListResponse<Notification>>, AppError> {
    let page = state
        .services
        .notifications
        .list_by_target(target, query.seen, &query.page_params().to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |n| n)))
}

async fn list_organization_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ListResponse<Notification>>, AppError> {
    list_for_target(&state, NotificationTarget::Organization(id), &query).await
}

async fn list_member_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ListResponse<Notification>>, AppError> {
    list_for_target(&state, NotificationTarget::Member(id), &query).await
}

/// A user may only read their own notifications
async fn list_user_notifications(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ListResponse<Notification>>, AppError> {
    identity.ensure_is(id)?;
    list_for_target(&state, NotificationTarget::User(id), &query).await
}

async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(state.services.notifications.find(id).await?))
}

async fn create_notification(
    State(state): State<AppState>,
    Json(req): Json<NewNotification>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    let notification = state.services.notifications.create(req).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn mark_seen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(state.services.notifications.mark_seen(id).await?))
}

async fn mark_sent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(state.services.notifications.mark_sent(id).await?))
}

async fn delete_notification(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.notifications.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route(
            "/api/notifications/{id}",
            get(get_notification).delete(delete_notification),
        )
        .route("/api/notifications/{id}/seen", patch(mark_seen))
        .route("/api/notifications/{id}/sent", patch(mark_sent))
        .route(
            "/api/organizations/{id}/notifications",
            get(list_organization_notifications),
        )
        .route("/api/members/{id}/notifications", get(list_member_notifications))
        .route("/api/users/{id}/notifications", get(list_user_notifications))
}
