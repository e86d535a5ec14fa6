use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use magjob_core::{Shift, ShiftEditRequest};
use serde::Serialize;
use uuid::Uuid;

use super::params::{ListResponse, PageParams};
use crate::error::AppError;
use crate::identity::Identity;
use crate::service::shift::{EndShift, EndedShift, ShiftDetails, StartShift};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndShiftResponse {
    pub id: i64,
    pub end_time: NaiveDateTime,
    pub notes: Option<String>,
}

impl From<EndedShift> for EndShiftResponse {
    fn from(ended: EndedShift) -> Self {
        Self {
            id: ended.shift.id,
            end_time: ended.shift.end_time,
            notes: ended.notes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDetailsResponse {
    #[serde(flatten)]
    pub shift: Shift,
    pub shift_edit_requests: Vec<ShiftEditRequest>,
}

impl From<ShiftDetails> for ShiftDetailsResponse {
    fn from(details: ShiftDetails) -> Self {
        Self {
            shift: details.shift,
            shift_edit_requests: details.edit_requests,
        }
    }
}

/// Open a shift for the caller
async fn start_shift(
    State(state): State<AppState>,
    identity: Option<Identity>,
    Json(req): Json<StartShift>,
) -> Result<(StatusCode, Json<Shift>), AppError> {
    let shift = state.services.shifts.start(req, identity).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

/// Body is optional; one that does not parse is treated as empty.
fn parse_end_request(body: &[u8]) -> EndShift {
    if body.iter().all(u8::is_ascii_whitespace) {
        return EndShift::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!("Ignoring unreadable end-shift body: {}", e);
        EndShift::default()
    })
}

async fn end_shift(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<EndShiftResponse>, AppError> {
    let ended = state.services.shifts.end(id, parse_end_request(&body)).await?;
    Ok(Json(ended.into()))
}

async fn get_shift(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ShiftDetailsResponse>, AppError> {
    let details = state.services.shifts.find(id).await?;
    Ok(Json(details.into()))
}

async fn delete_shift(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    state.services.shifts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_member_shifts(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Shift>>, AppError> {
    let page = state
        .services
        .shifts
        .list_by_member(member_id, &params.to_request()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, |s| s)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shifts/start", post(start_shift))
        .route("/api/shifts/end/{id}", put(end_shift))
        .route("/api/shifts/{id}", get(get_shift).delete(delete_shift))
        .route("/api/members/{id}/shifts", get(list_member_shifts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use magjob_core::EditRequestStatus;

    #[test]
    fn test_end_request_parsing_is_lenient() {
        assert!(parse_end_request(b"").notes.is_none());
        assert!(parse_end_request(b"not json").notes.is_none());

        let request = parse_end_request(br#"{"endTime":"garbage","notes":"left early"}"#);
        assert_eq!(request.notes.as_deref(), Some("left early"));
        assert_eq!(request.end_time, Some(serde_json::json!("garbage")));
    }

    #[test]
    fn test_details_response_flattens_shift() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let details = ShiftDetails {
            shift: Shift {
                id: 3,
                start_time: start,
                end_time: start + chrono::Duration::hours(8),
                description: "Inventory".to_string(),
                member_id: None,
            },
            edit_requests: vec![ShiftEditRequest {
                id: 1,
                status: EditRequestStatus::Pending,
                start_time: start,
                end_time: start + chrono::Duration::hours(4),
                shift_id: 3,
            }],
        };

        let json = serde_json::to_value(ShiftDetailsResponse::from(details)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["description"], "Inventory");
        assert_eq!(json["shiftEditRequests"][0]["status"], "pending");
        assert_eq!(json["shiftEditRequests"][0]["shiftId"], 3);
    }
}
