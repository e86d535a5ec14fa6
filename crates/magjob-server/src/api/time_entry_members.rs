use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use magjob_core::TimeEntryMember;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::identity::Identity;
use crate::service::time_entry::{NewTimeEntryMember, TimeEntryMemberPatch};
use crate::AppState;

async fn list_members(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<TimeEntryMember>>, AppError> {
    let page = state
        .services
        .time_entry_members
        .list(&params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |m| m)))
}

async fn list_user_members(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<TimeEntryMember>>, AppError> {
    let page = state
        .services
        .time_entry_members
        .list_by_user(identity, user_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |m| m)))
}

async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeEntryMember>, AppError> {
    Ok(Json(state.services.time_entry_members.find(id).await?))
}

async fn create_member(
    State(state): State<AppState>,
    Json(req): Json<NewTimeEntryMember>,
) -> Result<(StatusCode, Json<TimeEntryMember>), AppError> {
    let member = state.services.time_entry_members.create(req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TimeEntryMemberPatch>,
) -> Result<Json<TimeEntryMember>, AppError> {
    Ok(Json(state.services.time_entry_members.update(id, req).await?))
}

async fn delete_member(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.time_entry_members.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/time-entry-members", get(list_members).post(create_member))
        .route(
            "/api/time-entry-members/{id}",
            get(get_member).patch(update_member).delete(delete_member),
        )
        .route("/api/users/{id}/time-entry-members", get(list_user_members))
}
