use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use magjob_core::Graphic;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::identity::Identity;
use crate::service::graphic::{CreateAndPopulateGraphic, GraphicPatch, NewGraphic};
use crate::AppState;

async fn list_graphics(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Graphic>>, AppError> {
    let page = state.services.graphics.list(&params.to_request()?).await?;
    Ok(Json(ListResponse::from_page(page, |g| g)))
}

/// Graphics the calling user takes part in
async fn list_user_graphics(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Graphic>>, AppError> {
    let page = state
        .services
        .graphics
        .list_by_user(identity, user_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |g| g)))
}

async fn get_graphic(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Graphic>, AppError> {
    Ok(Json(state.services.graphics.find(id).await?))
}

async fn create_graphic(
    State(state): State<AppState>,
    Json(req): Json<NewGraphic>,
) -> Result<(StatusCode, Json<Graphic>), AppError> {
    let graphic = state.services.graphics.create(req).await?;
    Ok((StatusCode::CREATED, Json(graphic)))
}

async fn update_graphic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GraphicPatch>,
) -> Result<Json<Graphic>, AppError> {
    Ok(Json(state.services.graphics.update(id, req).await?))
}

async fn delete_graphic(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.graphics.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a graphic populated from an availability template
async fn create_and_populate(
    State(state): State<AppState>,
    Json(req): Json<CreateAndPopulateGraphic>,
) -> Result<(StatusCode, Json<Graphic>), AppError> {
    let graphic = state.services.graphics.create_and_populate(req).await?;
    Ok((StatusCode::CREATED, Json(graphic)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/graphics", get(list_graphics).post(create_graphic))
        .route(
            "/api/graphics/{id}",
            get(get_graphic).patch(update_graphic).delete(delete_graphic),
        )
        .route("/api/users/{id}/graphics", get(list_user_graphics))
        .route("/api/createGraphic", post(create_and_populate))
}
