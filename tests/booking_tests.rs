//! Booking lifecycle, overlap policy and per-user visibility.

mod common;

use axum::http::StatusCode;
use common::{ADMIN_KEY, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_booking_starts_pending_and_admin_confirms() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-01", "Front row").await;
    let (_, student_key) = app.register_student("booker@lab.local").await;

    let (status, body) = app
        .post(
            "/api/bookings",
            &student_key,
            json!({
                "computer_id": computer_id,
                "start_time": "2030-01-15T10:00:00Z",
                "end_time": "2030-01-15T11:00:00Z",
                "purpose": "Thesis work",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["start_time"], "2030-01-15T10:00:00.000Z");
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    // Students cannot confirm their own booking.
    let (status, _) = app
        .put(
            &format!("/api/bookings/{booking_id}/status"),
            &student_key,
            json!({ "status": "confirmed" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &format!("/api/bookings/{booking_id}/status"),
            ADMIN_KEY,
            json!({ "status": "confirmed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    // The owner hears about it.
    let (_, body) = app.get("/api/notifications", &student_key).await;
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "booking");
}

#[tokio::test]
async fn test_invalid_transitions_conflict() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-02", "Back row").await;

    let (_, body) = app
        .post(
            "/api/bookings",
            ADMIN_KEY,
            json!({
                "computer_id": computer_id,
                "start_time": "2030-02-01T09:00:00Z",
                "end_time": "2030-02-01T10:00:00Z",
            }),
        )
        .await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/bookings/{booking_id}/status");

    // pending -> completed skips confirmation
    let (status, _) = app.put(&uri, ADMIN_KEY, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.put(&uri, ADMIN_KEY, json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);

    // cancelled is terminal
    let (status, _) = app.put(&uri, ADMIN_KEY, json!({ "status": "confirmed" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_end_must_follow_start() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-03", "Corner").await;

    for (start, end) in [
        ("2030-03-01T11:00:00Z", "2030-03-01T10:00:00Z"),
        ("2030-03-01T10:00:00Z", "2030-03-01T10:00:00Z"),
        ("tomorrow", "2030-03-01T10:00:00Z"),
    ] {
        let (status, _) = app
            .post(
                "/api/bookings",
                ADMIN_KEY,
                json!({ "computer_id": computer_id, "start_time": start, "end_time": end }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{start} -> {end}");
    }
}

#[tokio::test]
async fn test_overlapping_bookings_both_succeed_under_warn_policy() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-04", "Window").await;
    let (_, first_key) = app.register_student("first@lab.local").await;
    let (_, second_key) = app.register_student("second@lab.local").await;

    let (status, first) = app
        .post(
            "/api/bookings",
            &first_key,
            json!({
                "computer_id": computer_id,
                "start_time": "2030-04-01T10:00:00Z",
                "end_time": "2030-04-01T11:00:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["data"]["conflicts"].as_array().unwrap().is_empty());

    let (status, second) = app
        .post(
            "/api/bookings",
            &second_key,
            json!({
                "computer_id": computer_id,
                "start_time": "2030-04-01T10:30:00Z",
                "end_time": "2030-04-01T11:30:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["status"], "pending");
    assert_eq!(second["data"]["conflicts"], json!([first["data"]["id"]]));

    // Back-to-back windows do not overlap.
    let (_, third) = app
        .post(
            "/api/bookings",
            &first_key,
            json!({
                "computer_id": computer_id,
                "start_time": "2030-04-01T11:30:00Z",
                "end_time": "2030-04-01T12:00:00Z",
            }),
        )
        .await;
    assert!(third["data"]["conflicts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reject_policy_refuses_overlap() {
    let app = common::spawn_app_with(|config| {
        config.booking.overlap_policy = labdesk::domain::booking::OverlapPolicy::Reject;
    })
    .await;
    let computer_id = app.create_computer("PC-05", "Aisle").await;

    let booking = |start: &str, end: &str| {
        json!({ "computer_id": computer_id, "start_time": start, "end_time": end })
    };

    let (status, _) = app
        .post(
            "/api/bookings",
            ADMIN_KEY,
            booking("2030-05-01T10:00:00Z", "2030-05-01T11:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/bookings",
            ADMIN_KEY,
            booking("2030-05-01T10:59:00Z", "2030-05-01T12:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_students_only_see_their_own_bookings() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-06", "Lab B").await;
    let (alice_id, alice_key) = app.register_student("alice@lab.local").await;
    let (_, bob_key) = app.register_student("bob@lab.local").await;

    let (_, alice_booking) = app
        .post(
            "/api/bookings",
            &alice_key,
            json!({
                "computer_id": computer_id,
                "start_time": "2030-06-01T10:00:00Z",
                "end_time": "2030-06-01T11:00:00Z",
            }),
        )
        .await;
    app.post(
        "/api/bookings",
        &bob_key,
        json!({
            "computer_id": computer_id,
            "start_time": "2030-06-02T10:00:00Z",
            "end_time": "2030-06-02T11:00:00Z",
        }),
    )
    .await;

    let (_, body) = app.get("/api/bookings", &alice_key).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows.iter().all(|b| b["user_id"] == alice_id));

    let (_, body) = app.get("/api/bookings", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let alice_booking_id = alice_booking["data"]["id"].as_str().unwrap();
    let (status, _) = app
        .get(&format!("/api/bookings/{alice_booking_id}"), &bob_key)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlaps_under_reject_policy_conflict_cleanly() {
    let app = common::spawn_app_with(|config| {
        config.booking.overlap_policy = labdesk::domain::booking::OverlapPolicy::Reject;
    })
    .await;
    let computer_id = app.create_computer("PC-07", "Busy seat").await;
    let body = json!({
        "computer_id": computer_id,
        "start_time": "2030-09-01T10:00:00Z",
        "end_time": "2030-09-01T11:00:00Z",
    });

    let attempts = (0..8).map(|_| app.post("/api/bookings", ADMIN_KEY, body.clone()));
    let statuses: Vec<StatusCode> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|(status, _)| status)
        .collect();

    let created = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let rejected = statuses
        .iter()
        .filter(|s| **s == StatusCode::CONFLICT)
        .count();
    assert_eq!(created, 1, "{statuses:?}");
    assert_eq!(rejected, 7, "{statuses:?}");

    let (_, body) = app.get("/api/bookings", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_staff_review_policy_notifies_staff_on_overlap_only() {
    let app = common::spawn_app_with(|config| {
        config.booking.overlap_policy = labdesk::domain::booking::OverlapPolicy::StaffReview;
    })
    .await;
    let computer_id = app.create_computer("PC-08", "Review desk").await;
    let (staff_id, staff_key) = app.register_student("staff@lab.local").await;
    let (status, _) = app
        .put(
            &format!("/api/users/{staff_id}/role"),
            ADMIN_KEY,
            json!({ "role": "lab_staff" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, student_key) = app.register_student("reviewed@lab.local").await;

    let booking = |start: &str, end: &str| {
        json!({ "computer_id": computer_id, "start_time": start, "end_time": end })
    };
    let unread = |key: String| {
        let app = &app;
        async move {
            let (_, body) = app.get("/api/notifications/unread-count", &key).await;
            body["data"]["count"].as_u64().unwrap()
        }
    };

    let (status, _) = app
        .post(
            "/api/bookings",
            &student_key,
            booking("2030-10-01T10:00:00Z", "2030-10-01T11:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(
            "/api/bookings",
            &student_key,
            booking("2030-10-01T11:00:00Z", "2030-10-01T12:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread(ADMIN_KEY.to_string()).await, 0);
    assert_eq!(unread(staff_key.clone()).await, 0);

    let (status, body) = app
        .post(
            "/api/bookings",
            &student_key,
            booking("2030-10-01T10:30:00Z", "2030-10-01T11:30:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["conflicts"].as_array().unwrap().len(), 2);

    assert_eq!(unread(ADMIN_KEY.to_string()).await, 1);
    assert_eq!(unread(staff_key.clone()).await, 1);
    assert_eq!(unread(student_key.clone()).await, 0);

    let (_, body) = app
        .get("/api/notifications?unread_only=true", &staff_key)
        .await;
    let mine: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["user_id"] == staff_id)
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["type"], "booking");
}
