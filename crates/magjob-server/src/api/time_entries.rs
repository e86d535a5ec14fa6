use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use magjob_core::TimeEntry;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::service::time_entry::{NewTimeEntry, TimeEntryPatch};
use crate::AppState;

async fn list_graphic_entries(
    State(state): State<AppState>,
    Path(graphic_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<TimeEntry>>, AppError> {
    let page = state
        .services
        .time_entries
        .list_by_graphic(graphic_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |e| e)))
}

async fn get_entry(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<TimeEntry>, AppError> {
    Ok(Json(state.services.time_entries.find(id).await?))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<NewTimeEntry>,
) -> Result<(StatusCode, Json<TimeEntry>), AppError> {
    let entry = state.services.time_entries.create(req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TimeEntryPatch>,
) -> Result<Json<TimeEntry>, AppError> {
    Ok(Json(state.services.time_entries.update(id, req).await?))
}

async fn delete_entry(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.time_entries.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/time-entries", post(create_entry))
        .route(
            "/api/time-entries/{id}",
            get(get_entry).patch(update_entry).delete(delete_entry),
        )
        .route("/api/graphics/{id}/time-entries", get(list_graphic_entries))
}
