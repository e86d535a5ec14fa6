use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use magjob_core::{AvailabilityTemplate, Graphic, TimeEntryTemplate};
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::service::availability::{AvailabilityTemplatePatch, NewAvailabilityTemplate, PopulateGraphic};
use crate::AppState;

/// List availability templates
async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<AvailabilityTemplate>>, AppError> {
    let page = state
        .services
        .availability_templates
        .list(&params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |t| t)))
}

/// List the templates of one organization
async fn list_organization_templates(
    State(state): State<AppState>,
    Path(organization_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<AvailabilityTemplate>>, AppError> {
    let page = state
        .services
        .availability_templates
        .list_by_organization(organization_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |t| t)))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityTemplate>, AppError> {
    Ok(Json(state.services.availability_templates.find(id).await?))
}

async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<NewAvailabilityTemplate>,
) -> Result<(StatusCode, Json<AvailabilityTemplate>), AppError> {
    let template = state.services.availability_templates.create(req).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AvailabilityTemplatePatch>,
) -> Result<Json<AvailabilityTemplate>, AppError> {
    Ok(Json(state.services.availability_templates.update(id, req).await?))
}

async fn delete_template(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.services.availability_templates.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_time_entry_templates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimeEntryTemplate>>, AppError> {
    Ok(Json(
        state
            .services
            .availability_templates
            .time_entry_templates(id)
            .await?,
    ))
}

/// Expand a template into an existing graphic
async fn populate_graphic(
    State(state): State<AppState>,
    Json(req): Json<PopulateGraphic>,
) -> Result<Json<Graphic>, AppError> {
    Ok(Json(
        state
            .services
            .availability_templates
            .populate_graphic(req)
            .await?,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/availability-templates",
            get(list_templates).post(create_template),
        )
        .route("/api/availability-templates/populate", post(populate_graphic))
        .route(
            "/api/availability-templates/{id}",
            get(get_template)
                .patch(update_template)
                .delete(delete_template),
        )
        .route(
            "/api/availability-templates/{id}/time-entry-templates",
            get(get_time_entry_templates),
        )
        .route(
            "/api/organizations/{id}/availability-templates",
            get(list_organization_templates),
        )
}
