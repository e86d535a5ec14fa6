use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use magjob_core::ShiftEditRequest;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::service::shift::{EditRequestUpdate, NewEditRequest};
use crate::AppState;

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ShiftEditRequest>, AppError> {
    Ok(Json(state.services.shift_edit_requests.find(id).await?))
}

async fn list_shift_requests(
    State(state): State<AppState>,
    Path(shift_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ShiftEditRequest>>, AppError> {
    let page = state
        .services
        .shift_edit_requests
        .list_by_shift(shift_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |r| r)))
}

async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<NewEditRequest>,
) -> Result<(StatusCode, Json<ShiftEditRequest>), AppError> {
    let request = state.services.shift_edit_requests.create(req).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Accepting a request also moves the shift to the requested times
async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EditRequestUpdate>,
) -> Result<Json<ShiftEditRequest>, AppError> {
    Ok(Json(state.services.shift_edit_requests.update(id, req).await?))
}

async fn delete_request(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    state.services.shift_edit_requests.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shift-edit-requests", post(create_request))
        .route(
            "/api/shift-edit-requests/{id}",
            get(get_request).patch(update_request).delete(delete_request),
        )
        .route("/api/shift-edit-requests/shift/{id}", get(list_shift_requests))
}
