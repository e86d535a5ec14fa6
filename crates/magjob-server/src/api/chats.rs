use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use magjob_core::Chat;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::service::chat::{ChatPatch, NewChat};
use crate::AppState;

async fn list_chats(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Chat>>, AppError> {
    let page = state.services.chats.list(&params.to_request()?).await?;
    Ok(Json(ListResponse::from_page(page, |c| c)))
}

async fn list_organization_chats(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Chat>>, AppError> {
    let page = state
        .services
        .chats
        .list_by_organization(organization_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |c| c)))
}

async fn list_member_chats(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Chat>>, AppError> {
    let page = state
        .services
        .chats
        .list_by_member(member_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |c| c)))
}

async fn get_chat(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Chat>, AppError> {
    Ok(Json(state.services.chats.find(id).await?))
}

/// Create a chat; the creator joins as its admin
async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<NewChat>,
) -> Result<(StatusCode, Json<Chat>), AppError> {
    let chat = state.services.chats.create(req).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

async fn update_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatPatch>,
) -> Result<Json<Chat>, AppError> {
    Ok(Json(state.services.chats.update(id, req).await?))
}

async fn delete_chat(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.chats.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chats", get(list_chats).post(create_chat))
        .route(
            "/api/chats/{id}",
            get(get_chat).patch(update_chat).delete(delete_chat),
        )
        .route("/api/organizations/{id}/chats", get(list_organization_chats))
        .route("/api/members/{id}/chats", get(list_member_chats))
}
