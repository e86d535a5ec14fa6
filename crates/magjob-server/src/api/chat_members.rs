use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use magjob_core::ChatMember;
use serde::Deserialize;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::service::chat::{Invitation, InvitationAnswer};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: String,
}

async fn get_member(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ChatMember>, AppError> {
    Ok(Json(state.services.chat_members.find(id).await?))
}

async fn list_chat_members(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ChatMember>>, AppError> {
    let page = state
        .services
        .chat_members
        .list_by_chat(chat_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |m| m)))
}

/// Invitations not yet accepted
async fn list_invitations(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ChatMember>>, AppError> {
    let page = state
        .services
        .chat_members
        .list_pending(chat_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |m| m)))
}

async fn list_member_memberships(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ChatMember>>, AppError> {
    let page = state
        .services
        .chat_members
        .list_by_member(member_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |m| m)))
}

async fn invite(
    State(state): State<AppState>,
    Json(req): Json<Invitation>,
) -> Result<(StatusCode, Json<ChatMember>), AppError> {
    let member = state.services.chat_members.invite(req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn set_nickname(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NicknameRequest>,
) -> Result<Json<ChatMember>, AppError> {
    Ok(Json(state.services.chat_members.set_nickname(id, req.nickname).await?))
}

async fn accept_invitation(
    State(state): State<AppState>,
    Json(req): Json<InvitationAnswer>,
) -> Result<Json<ChatMember>, AppError> {
    Ok(Json(state.services.chat_members.accept_invitation(req).await?))
}

async fn reject_invitation(
    State(state): State<AppState>,
    Json(req): Json<InvitationAnswer>,
) -> Result<StatusCode, AppError> {
    state.services.chat_members.reject_invitation(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn give_admin(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ChatMember>, AppError> {
    Ok(Json(state.services.chat_members.give_admin(id).await?))
}

async fn remove_admin(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ChatMember>, AppError> {
    Ok(Json(state.services.chat_members.remove_admin(id).await?))
}

async fn delete_member(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.chat_members.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat-members", post(invite))
        .route("/api/chat-members/accept", post(accept_invitation))
        .route("/api/chat-members/reject", post(reject_invitation))
        .route(
            "/api/chat-members/{id}",
            get(get_member).patch(set_nickname).delete(delete_member),
        )
        .route(
            "/api/chat-members/{id}/admin",
            put(give_admin).delete(remove_admin),
        )
        .route("/api/chats/{id}/chat-members", get(list_chat_members))
        .route("/api/chats/{id}/invitations", get(list_invitations))
        .route("/api/members/{id}/chat-members", get(list_member_memberships))
}
