use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use magjob_core::ChatMessage;
use serde::Deserialize;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::service::chat::NewMessage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ViewedRequest {
    pub viewer: String,
}

async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ChatMessage>>, AppError> {
    let page = state
        .services
        .chat_messages
        .list_by_chat(chat_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |m| m)))
}

async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<NewMessage>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let message = state.services.chat_messages.send(chat_id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn mark_viewed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ViewedRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    Ok(Json(state.services.chat_messages.mark_viewed(id, &req.viewer).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/chats/{id}/chat-messages",
            get(list_messages).post(send_message),
        )
        .route("/api/messages/{id}", patch(mark_viewed))
}
