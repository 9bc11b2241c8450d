//! End-to-end tests of the REST API over the in-memory repository.
//!
//! The clock is frozen at 2026-03-01 09:00 club time.

mod support;

use axum::http::{Method, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use court_booking::services::BookingPolicy;
use support::TestApp;

fn booking_body(court: i64, date: &str, start: &str) -> Value {
    json!({ "court": court, "date": date, "start_time": start })
}

fn slot_state<'a>(view: &'a Value, start: &str) -> &'a str {
    view["slots"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["start_time"] == start)
        .and_then(|s| s["state"].as_str())
        .unwrap()
}

// =========================================================
// Health & courts
// =========================================================

#[tokio::test]
async fn test_health_reports_database() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");

    app.repo.set_healthy(false);
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_list_courts() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app.send(Method::GET, "/v1/courts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courts"].as_array().unwrap().len(), 2);
}

// =========================================================
// Availability
// =========================================================

#[tokio::test]
async fn test_availability_future_day_is_open() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(Method::GET, "/v1/availability?court=1&date=2026-03-03", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["court_id"], 1);
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 14);
    assert_eq!(slots[0]["start_time"], "08:00");
    assert_eq!(slots[13]["start_time"], "21:00");
    assert!(slots.iter().all(|s| s["state"] == "available"));
    assert_eq!(slots[0]["is_prime_time"], true);
    assert_eq!(slots[4]["is_prime_time"], false);
}

#[tokio::test]
async fn test_availability_today_marks_started_slots_past() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(Method::GET, "/v1/availability?court=2&date=2026-03-01", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot_state(&body, "08:00"), "past");
    assert_eq!(slot_state(&body, "09:00"), "past");
    assert_eq!(slot_state(&body, "10:00"), "available");
}

#[tokio::test]
async fn test_availability_yesterday_is_all_past() {
    let app = TestApp::new(BookingPolicy::default());
    let (_, body) = app
        .send(Method::GET, "/v1/availability?court=1&date=2026-02-28", None, None)
        .await;
    assert!(body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["state"] == "past"));
}

#[tokio::test]
async fn test_availability_unknown_court_is_404() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(Method::GET, "/v1/availability?court=99&date=2026-03-03", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_availability_malformed_query_is_400() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(Method::GET, "/v1/availability?court=one&date=2026-03-03", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = app
        .send(Method::GET, "/v1/availability?court=1", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =========================================================
// Booking lifecycle
// =========================================================

#[tokio::test]
async fn test_booking_requires_token() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/bookings",
            None,
            Some(booking_body(1, "2026-03-03", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some("not-a-jwt"),
            Some(booking_body(1, "2026-03-03", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_conflict_cancel_rebook() {
    let app = TestApp::new(BookingPolicy::default());
    let alice = app.register("alice@example.com").await;
    let bob = app.register("bob@example.com").await;

    let (status, booking) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&alice),
            Some(booking_body(1, "2026-03-03", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", booking);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["start_time"], "10:00");
    assert_eq!(booking["is_prime_time"], true);
    let id = booking["id"].as_i64().unwrap();

    // Same slot, another member
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&bob),
            Some(booking_body(1, "2026-03-03", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SLOT_ALREADY_BOOKED");

    // Same slot on the other court is fine
    let (status, _) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&bob),
            Some(booking_body(2, "2026-03-03", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, view) = app
        .send(Method::GET, "/v1/availability?court=1&date=2026-03-03", None, None)
        .await;
    assert_eq!(slot_state(&view, "10:00"), "booked");
    assert_eq!(slot_state(&view, "11:00"), "available");

    // Bob cannot see or cancel Alice's booking
    let (status, body) = app
        .send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, cancelled) = app
        .send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, body) = app
        .send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (_, view) = app
        .send(Method::GET, "/v1/availability?court=1&date=2026-03-03", None, None)
        .await;
    assert_eq!(slot_state(&view, "10:00"), "available");

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&bob),
            Some(booking_body(1, "2026-03-03", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Cancelled rows stay in the member's history
    let (status, mine) = app.send(Method::GET, "/v1/bookings", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["bookings"][0]["status"], "cancelled");
}

#[tokio::test]
async fn test_booking_rule_violations() {
    let app = TestApp::new(BookingPolicy::default());
    let token = app.register("carol@example.com").await;

    let cases = [
        (booking_body(1, "2026-03-03", "07:00"), StatusCode::BAD_REQUEST, "INVALID_SLOT"),
        (booking_body(1, "2026-03-03", "10:30"), StatusCode::BAD_REQUEST, "INVALID_SLOT"),
        (booking_body(1, "2026-03-03", "22:00"), StatusCode::BAD_REQUEST, "INVALID_SLOT"),
        (booking_body(1, "2026-03-01", "09:00"), StatusCode::BAD_REQUEST, "SLOT_IN_PAST"),
        (booking_body(1, "2026-03-01", "20:00"), StatusCode::BAD_REQUEST, "ADVANCE_NOTICE"),
        (booking_body(99, "2026-03-03", "10:00"), StatusCode::BAD_REQUEST, "INVALID_SLOT"),
    ];

    for (body, expected_status, expected_code) in cases {
        let (status, error) = app
            .send(Method::POST, "/v1/bookings", Some(&token), Some(body.clone()))
            .await;
        assert_eq!(status, expected_status, "request {}", body);
        assert_eq!(error["code"], expected_code, "request {}", body);
    }

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&token),
            Some(json!({ "court": 1, "date": "2026-03-03", "start_time": "ten" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_permissive_policy_allows_short_notice() {
    let app = TestApp::new(BookingPolicy::permissive());
    let token = app.register("dan@example.com").await;
    let (status, booking) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&token),
            Some(booking_body(1, "2026-03-01", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = booking["id"].as_i64().unwrap();
    let (status, _) = app
        .send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cancellation_window_is_enforced() {
    let app = TestApp::new(BookingPolicy::default());
    let token = app.register("erin@example.com").await;
    let (status, booking) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&token),
            Some(booking_body(1, "2026-03-02", "10:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = booking["id"].as_i64().unwrap();

    // 09:00 club time on the day of play: one hour before the start
    let later = app.at(Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap());
    let (status, body) = later
        .send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CANCELLATION_WINDOW");
}

// =========================================================
// Accounts
// =========================================================

#[tokio::test]
async fn test_register_login_me() {
    let app = TestApp::new(BookingPolicy::default());
    app.register("Frank@Example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "frank@example.com", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = app.send(Method::GET, "/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "frank@example.com");
    assert_eq!(me["user"]["role"], "member");

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "frank@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_register_rejects_bad_input_and_duplicates() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("email"));

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": "grace@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.register("grace@example.com").await;
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": "GRACE@example.com", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

// =========================================================
// Administration
// =========================================================

#[tokio::test]
async fn test_admin_endpoints_require_admin_role() {
    let app = TestApp::new(BookingPolicy::default());
    let member = app.register("henry@example.com").await;

    let (status, body) = app
        .send(Method::GET, "/v1/admin/bookings?date=2026-03-03", Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .send(Method::GET, "/v1/admin/bookings?date=2026-03-03", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lists_and_confirms_bookings() {
    let app = TestApp::new(BookingPolicy::default());
    let member = app.register("iris@example.com").await;
    let admin = app.admin_token().await;

    let (_, booking) = app
        .send(
            Method::POST,
            "/v1/bookings",
            Some(&member),
            Some(booking_body(2, "2026-03-03", "16:00")),
        )
        .await;
    let id = booking["id"].as_i64().unwrap();

    let (status, list) = app
        .send(Method::GET, "/v1/admin/bookings?date=2026-03-03", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (status, confirmed) = app
        .send(
            Method::PUT,
            &format!("/v1/admin/bookings/{}/status", id),
            Some(&admin),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    // confirmed -> pending is not a lifecycle edge
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/v1/admin/bookings/{}/status", id),
            Some(&admin),
            Some(json!({ "status": "pending" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, _) = app
        .send(
            Method::PUT,
            "/v1/admin/bookings/4040/status",
            Some(&admin),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================
// Assistant
// =========================================================

#[tokio::test]
async fn test_chat_without_key_is_not_configured() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/chat",
            None,
            Some(json!({ "messages": [{ "role": "user", "content": "hello" }] })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "UPSTREAM_NOT_CONFIGURED");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new(BookingPolicy::default());
    let (status, _) = app.send(Method::GET, "/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
