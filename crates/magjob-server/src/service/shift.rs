use chrono::NaiveDateTime;
use magjob_core::{
    Clock, EditRequestStatus, NewShift, NewShiftEditRequest, Page, PageRequest, Shift,
    ShiftEditRequest,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ShiftRepository;
use crate::error::AppError;
use crate::identity::Identity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShift {
    /// Accepted for compatibility; the server clock decides the start.
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndShift {
    /// Accepted in any shape and only logged; the server clock decides the end.
    pub end_time: Option<serde_json::Value>,
    pub notes: Option<String>,
}

/// A closed shift plus the notes sent with the closing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedShift {
    pub shift: Shift,
    pub notes: Option<String>,
}

/// A shift together with every edit request filed against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDetails {
    pub shift: Shift,
    pub edit_requests: Vec<ShiftEditRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEditRequest {
    pub new_start_time: NaiveDateTime,
    pub new_end_time: NaiveDateTime,
    #[serde(default)]
    pub status: EditRequestStatus,
    pub shift_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequestUpdate {
    pub status: EditRequestStatus,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Clone)]
pub struct ShiftService {
    shifts: Arc<dyn ShiftRepository>,
    clock: Arc<dyn Clock>,
}

impl ShiftService {
    pub fn new(shifts: Arc<dyn ShiftRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { shifts, clock }
    }

    /// Opens a shift at server time with the default eight hour window.
    pub async fn start(&self, request: StartShift, identity: Option<Identity>) -> Result<Shift, AppError> {
        if let Some(requested) = request.start_time {
            tracing::debug!("Ignoring client start time {} in favour of server time", requested);
        }
        let now = self.clock.now();
        let member_id = identity.map(|i| i.user_id);
        let shift = self
            .shifts
            .insert_shift(NewShift::start(request.description, member_id, now))
            .await?;
        tracing::info!("Started shift {} at {}", shift.id, shift.start_time);
        Ok(shift)
    }

    pub async fn end(&self, id: i64, request: EndShift) -> Result<EndedShift, AppError> {
        let mut shift = self.find_shift(id).await?;
        if let Some(requested) = request.end_time {
            tracing::debug!("Ignoring client end time {} in favour of server time", requested);
        }
        shift.end(self.clock.now())?;
        self.shifts.update_shift(&shift).await?;
        tracing::info!("Ended shift {} at {}", shift.id, shift.end_time);
        Ok(EndedShift {
            shift,
            notes: request.notes,
        })
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.shifts.delete_shift(id).await? {
            return Err(AppError::not_found("Shift", id));
        }
        Ok(())
    }

    pub async fn find(&self, id: i64) -> Result<ShiftDetails, AppError> {
        let shift = self.find_shift(id).await?;
        let edit_requests = self
            .shifts
            .list_edit_requests_by_shift(id, &PageRequest::unpaged())
            .await?
            .items;
        Ok(ShiftDetails { shift, edit_requests })
    }

    pub async fn list_by_member(&self, member_id: Uuid, page: &PageRequest) -> Result<Page<Shift>, AppError> {
        self.shifts.list_shifts_by_member(member_id, page).await
    }

    async fn find_shift(&self, id: i64) -> Result<Shift, AppError> {
        self.shifts
            .find_shift(id)
            .await?
            .ok_or_else(|| AppError::not_found("Shift", id))
    }
}

#[derive(Clone)]
pub struct ShiftEditRequestService {
    shifts: Arc<dyn ShiftRepository>,
}

impl ShiftEditRequestService {
    pub fn new(shifts: Arc<dyn ShiftRepository>) -> Self {
        Self { shifts }
    }

    pub async fn find(&self, id: i64) -> Result<ShiftEditRequest, AppError> {
        self.shifts
            .find_edit_request(id)
            .await?
            .ok_or_else(|| AppError::not_found("Shift edit request", id))
    }

    pub async fn list_by_shift(&self, shift_id: i64, page: &PageRequest) -> Result<Page<ShiftEditRequest>, AppError> {
        self.shifts.list_edit_requests_by_shift(shift_id, page).await
    }

    /// Files a request. Nothing happens to the shift until an update accepts it.
    pub async fn create(&self, request: NewEditRequest) -> Result<ShiftEditRequest, AppError> {
        if self.shifts.find_shift(request.shift_id).await?.is_none() {
            return Err(AppError::not_found("Shift", request.shift_id));
        }
        self.shifts
            .insert_edit_request(NewShiftEditRequest {
                status: request.status,
                start_time: request.new_start_time,
                end_time: request.new_end_time,
                shift_id: request.shift_id,
            })
            .await
    }

    /// Revises the request; an accepted request overwrites the shift's window.
    pub async fn update(&self, id: i64, update: EditRequestUpdate) -> Result<ShiftEditRequest, AppError> {
        let mut request = self.find(id).await?;
        request.revise(update.status, update.start_time, update.end_time);

        let mut shift = None;
        if request.status == EditRequestStatus::Accepted {
            let mut target = self
                .shifts
                .find_shift(request.shift_id)
                .await?
                .ok_or_else(|| AppError::not_found("Shift", request.shift_id))?;
            request.apply_to(&mut target);
            shift = Some(target);
        }

        self.shifts
            .save_edit_request(&request, shift.as_ref())
            .await?;
        if shift.is_some() {
            tracing::info!("Edit request {} accepted, shift {} rescheduled", request.id, request.shift_id);
        }
        Ok(request)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.shifts.delete_edit_request(id).await? {
            return Err(AppError::not_found("Shift edit request", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::{Duration, NaiveDate};
    use magjob_core::FixedClock;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    struct Fixture {
        clock: Arc<FixedClock>,
        shifts: ShiftService,
        requests: ShiftEditRequestService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(at(8)));
        Fixture {
            clock: clock.clone(),
            shifts: ShiftService::new(store.clone(), clock),
            requests: ShiftEditRequestService::new(store),
        }
    }

    fn morning() -> StartShift {
        StartShift {
            start_time: None,
            description: "Morning".to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_uses_server_time() {
        let f = fixture();
        let member = Uuid::new_v4();
        let shift = f
            .shifts
            .start(
                StartShift {
                    start_time: Some(at(3)),
                    description: "Morning".to_string(),
                },
                Some(Identity::new(member)),
            )
            .await
            .unwrap();
        assert_eq!(shift.start_time, at(8));
        assert_eq!(shift.end_time, at(16));
        assert_eq!(shift.description, "Morning");
        assert_eq!(shift.member_id, Some(member));
    }

    #[tokio::test]
    async fn test_immediate_end_succeeds() {
        let f = fixture();
        let shift = f.shifts.start(morning(), None).await.unwrap();
        f.clock.advance(Duration::minutes(5));

        let ended = f
            .shifts
            .end(
                shift.id,
                EndShift {
                    end_time: Some(serde_json::json!("2025-06-02T23:00:00")),
                    notes: Some("done".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(ended.shift.end_time, at(8) + Duration::minutes(5));
        assert_eq!(ended.notes.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_end_after_window_conflicts() {
        let f = fixture();
        let shift = f.shifts.start(morning(), None).await.unwrap();
        f.clock.advance(Duration::hours(9));

        let result = f.shifts.end(shift.id, EndShift::default()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_end_missing_shift() {
        let f = fixture();
        let result = f.shifts.end(404, EndShift::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_accepting_request_reschedules_shift() {
        let f = fixture();
        let shift = f.shifts.start(morning(), None).await.unwrap();
        let request = f
            .requests
            .create(NewEditRequest {
                new_start_time: at(7),
                new_end_time: at(15),
                status: EditRequestStatus::Pending,
                shift_id: shift.id,
            })
            .await
            .unwrap();

        f.requests
            .update(
                request.id,
                EditRequestUpdate {
                    status: EditRequestStatus::Pending,
                    start_time: at(6),
                    end_time: at(14),
                },
            )
            .await
            .unwrap();
        let untouched = f.shifts.find(shift.id).await.unwrap().shift;
        assert_eq!((untouched.start_time, untouched.end_time), (at(8), at(16)));

        f.requests
            .update(
                request.id,
                EditRequestUpdate {
                    status: EditRequestStatus::Accepted,
                    start_time: at(6),
                    end_time: at(14),
                },
            )
            .await
            .unwrap();
        let details = f.shifts.find(shift.id).await.unwrap();
        assert_eq!((details.shift.start_time, details.shift.end_time), (at(6), at(14)));
        assert_eq!(details.edit_requests.len(), 1);
        assert_eq!(details.edit_requests[0].status, EditRequestStatus::Accepted);
    }

    #[tokio::test]
    async fn test_creating_accepted_request_has_no_side_effect() {
        let f = fixture();
        let shift = f.shifts.start(morning(), None).await.unwrap();
        f.requests
            .create(NewEditRequest {
                new_start_time: at(1),
                new_end_time: at(2),
                status: EditRequestStatus::Accepted,
                shift_id: shift.id,
            })
            .await
            .unwrap();
        let stored = f.shifts.find(shift.id).await.unwrap().shift;
        assert_eq!(stored.start_time, at(8));
    }

    #[tokio::test]
    async fn test_request_for_missing_shift() {
        let f = fixture();
        let result = f
            .requests
            .create(NewEditRequest {
                new_start_time: at(1),
                new_end_time: at(2),
                status: EditRequestStatus::Pending,
                shift_id: 99,
            })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_shift_removes_requests() {
        let f = fixture();
        let shift = f.shifts.start(morning(), None).await.unwrap();
        let request = f
            .requests
            .create(NewEditRequest {
                new_start_time: at(7),
                new_end_time: at(15),
                status: EditRequestStatus::Pending,
                shift_id: shift.id,
            })
            .await
            .unwrap();

        f.shifts.delete(shift.id).await.unwrap();
        assert!(matches!(f.requests.find(request.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(f.shifts.delete(shift.id).await, Err(AppError::NotFound(_))));
    }
}
