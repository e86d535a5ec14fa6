use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use magjob_core::FixedClock;
use magjob_server::{build_app, db::Repositories, identity::USER_ID_HEADER, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn monday_nine() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn app() -> (Router, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(monday_nine()));
    let state = AppState::new(Repositories::memory(), clock.clone());
    (build_app(state), clock)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_shift_lifecycle() {
    let (app, clock) = app();
    let member = Uuid::new_v4();

    let (status, shift) = call(
        &app,
        Method::POST,
        "/api/shifts/start",
        Some(member),
        Some(json!({ "startTime": "2020-01-01T00:00:00", "description": "Inventory" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shift["startTime"], "2025-06-02T09:00:00");
    assert_eq!(shift["endTime"], "2025-06-02T17:00:00");
    assert_eq!(shift["memberId"], member.to_string());
    let id = shift["id"].as_i64().unwrap();

    clock.advance(Duration::hours(1));
    let (status, ended) = call(
        &app,
        Method::PUT,
        &format!("/api/shifts/end/{}", id),
        None,
        Some(json!({ "notes": "done early" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["endTime"], "2025-06-02T10:00:00");
    assert_eq!(ended["notes"], "done early");

    clock.advance(Duration::hours(1));
    let (status, _) = call(&app, Method::PUT, &format!("/api/shifts/end/{}", id), None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, Method::PUT, "/api/shifts/end/999", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = call(&app, Method::GET, &format!("/api/members/{}/shifts", member), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/shifts/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &format!("/api/shifts/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accepted_edit_request_moves_shift() {
    let (app, _) = app();
    let (_, shift) = call(
        &app,
        Method::POST,
        "/api/shifts/start",
        None,
        Some(json!({ "description": "Front desk" })),
    )
    .await;
    let shift_id = shift["id"].as_i64().unwrap();

    let (status, request) = call(
        &app,
        Method::POST,
        "/api/shift-edit-requests",
        None,
        Some(json!({
            "newStartTime": "2025-06-02T08:00:00",
            "newEndTime": "2025-06-02T12:00:00",
            "shiftId": shift_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_i64().unwrap();

    let (status, updated) = call(
        &app,
        Method::PATCH,
        &format!("/api/shift-edit-requests/{}", request_id),
        None,
        Some(json!({
            "status": "ACCEPTED",
            "startTime": "2025-06-02T08:00:00",
            "endTime": "2025-06-02T12:00:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "accepted");

    let (_, details) = call(&app, Method::GET, &format!("/api/shifts/{}", shift_id), None, None).await;
    assert_eq!(details["startTime"], "2025-06-02T08:00:00");
    assert_eq!(details["endTime"], "2025-06-02T12:00:00");
    assert_eq!(details["shiftEditRequests"].as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/shift-edit-requests",
        None,
        Some(json!({
            "newStartTime": "2025-06-02T08:00:00",
            "newEndTime": "2025-06-02T12:00:00",
            "shiftId": 4242
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_graphic_from_template() {
    let (app, _) = app();
    let member = Uuid::new_v4();

    let (status, template) = call(
        &app,
        Method::POST,
        "/api/availability-templates",
        None,
        Some(json!({
            "name": "Weekday",
            "organizationId": 7,
            "startDayOfWeek": "MONDAY",
            "numberOfDays": 1,
            "timeEntryTemplates": [{
                "startDayOffset": 0,
                "endDayOffset": 0,
                "startTime": "09:00:00",
                "endTime": "17:00:00"
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(template["startDayOfWeek"], "MONDAY");

    let (status, graphic) = call(
        &app,
        Method::POST,
        "/api/createGraphic",
        None,
        Some(json!({
            "availabilityTemplateId": template["id"],
            "name": "June rota",
            "managerId": 3,
            "startDate": "2025-06-02",
            "timeEntryMembers": [{ "status": "assigned", "memberId": member }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entries = graphic["timeEntries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["startDateTime"], "2025-06-02T09:00:00");
    assert_eq!(entries[0]["endDateTime"], "2025-06-02T17:00:00");
    assert_eq!(entries[0]["graphicId"], graphic["id"]);

    let (status, mine) = call(
        &app,
        Method::GET,
        &format!("/api/users/{}/graphics", member),
        Some(member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["count"], 1);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/users/{}/graphics", member),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, &format!("/api/users/{}/graphics", member), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_graphic_with_missing_template() {
    let (app, _) = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/createGraphic",
        None,
        Some(json!({
            "availabilityTemplateId": Uuid::new_v4(),
            "name": "Orphan",
            "managerId": 1,
            "startDate": "2025-06-02"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_notification_targets() {
    let (app, _) = app();
    let user = Uuid::new_v4();

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/notifications",
        None,
        Some(json!({ "content": "nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/notifications",
        None,
        Some(json!({ "content": "both", "userId": user, "memberId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/notifications",
        None,
        Some(json!({ "content": "Your shift starts soon", "userId": user })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["seen"], false);
    assert_eq!(created["memberId"], Value::Null);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, seen) = call(&app, Method::PATCH, &format!("/api/notifications/{}/seen", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["seen"], true);

    let (status, unseen) = call(
        &app,
        Method::GET,
        &format!("/api/users/{}/notifications?seen=false", user),
        Some(user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unseen["count"], 0);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/users/{}/notifications", user),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chat_invitation_flow() {
    let (app, _) = app();
    let owner = Uuid::new_v4();
    let guest = Uuid::new_v4();

    let (status, chat) = call(
        &app,
        Method::POST,
        "/api/chats",
        None,
        Some(json!({ "title": "Warehouse", "organizationId": Uuid::new_v4(), "memberId": owner })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let chat_id = chat["id"].as_str().unwrap().to_string();

    let (status, invited) = call(
        &app,
        Method::POST,
        "/api/chat-members",
        None,
        Some(json!({ "chatId": chat_id, "memberId": guest, "nickname": "Sam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/chats/{}/chat-messages", chat_id),
        None,
        Some(json!({ "chatMemberId": invited["id"], "content": "hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pending) = call(&app, Method::GET, &format!("/api/chats/{}/invitations", chat_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["count"], 1);

    let answer = json!({ "chatId": chat_id, "memberId": guest });
    let (status, accepted) = call(&app, Method::POST, "/api/chat-members/accept", None, Some(answer.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["isInvitationAccepted"], true);

    let (status, _) = call(&app, Method::POST, "/api/chat-members/accept", None, Some(answer)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, message) = call(
        &app,
        Method::POST,
        &format!("/api/chats/{}/chat-messages", chat_id),
        None,
        Some(json!({ "chatMemberId": invited["id"], "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, viewed) = call(
        &app,
        Method::PATCH,
        &format!("/api/messages/{}", message["id"].as_str().unwrap()),
        None,
        Some(json!({ "viewer": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["viewedBy"], json!(["Admin"]));

    let (status, members) = call(&app, Method::GET, &format!("/api/chats/{}/chat-members", chat_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members["count"], 2);
}

#[tokio::test]
async fn test_end_shift_outcome_ignores_body() {
    let (app, clock) = app();
    let (_, shift) = call(
        &app,
        Method::POST,
        "/api/shifts/start",
        None,
        Some(json!({ "description": "Night" })),
    )
    .await;
    let uri = format!("/api/shifts/end/{}", shift["id"].as_i64().unwrap());
    clock.advance(Duration::hours(9));

    let (status, _) = call(&app, Method::PUT, &uri, None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::PUT,
        &uri,
        None,
        Some(json!({ "endTime": "2025-06-02T18:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/shifts/end/999",
        None,
        Some(json!({ "endTime": "garbage" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, open) = call(&app, Method::POST, "/api/shifts/start", None, Some(json!({}))).await;
    let (status, ended) = call(
        &app,
        Method::PUT,
        &format!("/api/shifts/end/{}", open["id"].as_i64().unwrap()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["endTime"], "2025-06-02T18:00:00");
    assert_eq!(ended["notes"], Value::Null);
}

#[tokio::test]
async fn test_populated_entries_follow_template_order() {
    let (app, _) = app();
    let (_, template) = call(
        &app,
        Method::POST,
        "/api/availability-templates",
        None,
        Some(json!({
            "name": "Split week",
            "organizationId": 7,
            "startDayOfWeek": "MONDAY",
            "numberOfDays": 5,
            "timeEntryTemplates": [
                { "startDayOffset": 4, "endDayOffset": 4, "startTime": "08:00:00", "endTime": "12:00:00" },
                { "startDayOffset": 0, "endDayOffset": 0, "startTime": "09:00:00", "endTime": "17:00:00" }
            ]
        })),
    )
    .await;

    let (status, graphic) = call(
        &app,
        Method::POST,
        "/api/createGraphic",
        None,
        Some(json!({
            "availabilityTemplateId": template["id"],
            "name": "Week 23",
            "managerId": 3,
            "startDate": "2025-06-02"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let starts: Vec<&str> = graphic["timeEntries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["startDateTime"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["2025-06-06T08:00:00", "2025-06-02T09:00:00"]);

    let (_, fetched) = call(
        &app,
        Method::GET,
        &format!("/api/graphics/{}", graphic["id"].as_str().unwrap()),
        None,
        None,
    )
    .await;
    assert_eq!(fetched["timeEntries"], graphic["timeEntries"]);
}
