//! Account deletion, notifications, notices, reminders and the dashboard.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{ADMIN_KEY, spawn_app};
use labdesk::domain::Role;
use serde_json::json;

#[tokio::test]
async fn test_delete_account_removes_owned_rows() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-50", "Station 50").await;
    let (_, student_key) = app.register_student("leaving@lab.local").await;

    app.post(
        "/api/bookings",
        &student_key,
        json!({
            "computer_id": computer_id,
            "start_time": "2030-08-01T10:00:00Z",
            "end_time": "2030-08-01T11:00:00Z",
        }),
    )
    .await;

    let (status, body) = app
        .post("/functions/delete-account", &student_key, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["deleted"]["bookings"], 1);
    assert_eq!(body["deleted"]["users"], 1);

    let (status, _) = app.get("/api/auth/me", &student_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app.get("/api/bookings", ADMIN_KEY).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_last_admin_cannot_delete_own_account() {
    let app = spawn_app().await;

    let (status, _) = app
        .post("/functions/delete-account", ADMIN_KEY, json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request("POST", "/functions/delete-account", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notifications_fan_out_and_read_state() {
    let app = spawn_app().await;
    let (_, alice_key) = app.register_student("alice-n@lab.local").await;
    let (_, bob_key) = app.register_student("bob-n@lab.local").await;

    let (status, _) = app
        .post(
            "/api/notifications",
            &alice_key,
            json!({ "user_id": "all", "title": "Hi", "message": "From a student" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/notifications",
            ADMIN_KEY,
            json!({
                "user_id": "all",
                "type": "maintenance",
                "title": "Lab closed Friday",
                "message": "Network upgrade",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    // Admin plus two students.
    assert_eq!(body["data"]["sent"], 3);

    let (_, body) = app.get("/api/notifications/unread-count", &alice_key).await;
    assert_eq!(body["data"]["count"], 1);

    let (_, body) = app.get("/api/notifications", &alice_key).await;
    let notification_id = body["data"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"][0]["type"], "maintenance");

    // Bob cannot touch Alice's notification.
    let (status, _) = app
        .put(
            &format!("/api/notifications/{notification_id}/read"),
            &bob_key,
            json!({}),
        )
        .await;
    assert_ne!(status, StatusCode::OK);

    let (status, _) = app
        .put(
            &format!("/api/notifications/{notification_id}/read"),
            &alice_key,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/notifications/unread-count", &alice_key).await;
    assert_eq!(body["data"]["count"], 0);

    let (status, _) = app
        .put("/api/notifications/read-all", &bob_key, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/notifications/unread-count", &bob_key).await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_students_only_see_live_notices() {
    let app = spawn_app().await;
    let (_, student_key) = app.register_student("reader@lab.local").await;

    for notice in [
        json!({ "title": "Welcome", "content": "Lab rules apply" }),
        json!({ "title": "Draft", "content": "Not yet", "is_active": false }),
        json!({ "title": "Old", "content": "Expired", "expires_at": "2020-01-01T00:00:00Z" }),
    ] {
        let (status, _) = app.post("/api/notices", ADMIN_KEY, notice).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = app
        .post(
            "/api/notices",
            &student_key,
            json!({ "title": "Mine", "content": "Students cannot post" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get("/api/notices", &student_key).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Welcome"]);

    let (_, body) = app.get("/api/notices", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_reminders_depend_on_role() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-60", "Station 60").await;
    let (_, student_key) = app.register_student("soon@lab.local").await;

    let start = Utc::now() + Duration::hours(3);
    let end = start + Duration::hours(1);
    let (status, _) = app
        .post(
            "/api/bookings",
            &student_key,
            json!({
                "computer_id": computer_id,
                "start_time": start.to_rfc3339(),
                "end_time": end.to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let expiry = (Utc::now() + Duration::days(10)).format("%Y-%m-%d").to_string();
    let (status, _) = app
        .post(
            "/api/software",
            ADMIN_KEY,
            json!({ "name": "CAD Suite", "vendor": "Acme", "license_expiry": expiry }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/reminders", &student_key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["bookings"][0]["computer_name"], "Station 60");
    assert!(body["data"]["licenses"].as_array().unwrap().is_empty());
    assert!(body["data"]["maintenance"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/reminders", ADMIN_KEY).await;
    assert_eq!(body["data"]["licenses"][0]["name"], "CAD Suite");
    // Never maintained, so it is due.
    assert_eq!(body["data"]["maintenance"][0]["computer_id"], computer_id);
    assert!(body["data"]["maintenance"][0]["last_maintenance"].is_null());
}

#[tokio::test]
async fn test_summary_hides_staff_counts_from_students() {
    let app = spawn_app().await;
    app.create_computer("PC-70", "Station 70").await;
    app.create_computer("PC-71", "Station 71").await;
    let (_, student_key) = app.register_student("summary@lab.local").await;

    let (_, body) = app.get("/api/dashboard/summary", ADMIN_KEY).await;
    assert_eq!(body["data"]["total_computers"], 2);
    assert_eq!(body["data"]["available_computers"], 2);
    assert_eq!(body["data"]["total_users"], 2);

    let (_, body) = app.get("/api/dashboard/summary", &student_key).await;
    assert_eq!(body["data"]["total_computers"], 2);
    assert!(body["data"].get("total_users").is_none());
}

#[tokio::test]
async fn test_software_and_maintenance_conflicts() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-80", "Station 80").await;

    let (_, body) = app
        .post("/api/software", ADMIN_KEY, json!({ "name": "Editor" }))
        .await;
    let software_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/software/{software_id}/installations");

    let (status, _) = app
        .post(&uri, ADMIN_KEY, json!({ "computer_id": computer_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(&uri, ADMIN_KEY, json!({ "computer_id": computer_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            "/api/maintenance",
            ADMIN_KEY,
            json!({
                "computer_id": computer_id,
                "maintenance_type": "Preventive",
                "description": "Dust the fans",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let log_id = body["data"]["id"].as_str().unwrap().to_string();

    let complete = format!("/api/maintenance/{log_id}/complete");
    let (status, body) = app.post(&complete, ADMIN_KEY, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["completed_at"].is_string());

    let (status, _) = app.post(&complete, ADMIN_KEY, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_role_predicates_follow_user_roles() {
    let app = spawn_app().await;
    let (student_id, _) = app.register_student("predicate@lab.local").await;
    let admin_id = app.admin_id().await;
    let store = app.state.store();

    assert!(store.has_role(&admin_id, Role::Admin).await.unwrap());
    assert!(store.is_admin_or_staff(&admin_id).await.unwrap());
    assert!(store.has_role(&student_id, Role::Student).await.unwrap());
    assert!(!store.is_admin_or_staff(&student_id).await.unwrap());

    app.put(
        &format!("/api/users/{student_id}/role"),
        ADMIN_KEY,
        json!({ "role": "lab_staff" }),
    )
    .await;
    assert!(store.is_admin_or_staff(&student_id).await.unwrap());
    assert!(!store.has_role(&student_id, Role::Student).await.unwrap());

    let unknown = uuid::Uuid::new_v4().to_string();
    assert!(!store.is_admin_or_staff(&unknown).await.unwrap());
}

#[tokio::test]
async fn test_students_only_see_their_own_notifications() {
    let app = spawn_app().await;
    let (alice_id, alice_key) = app.register_student("alice-list@lab.local").await;
    let (bob_id, bob_key) = app.register_student("bob-list@lab.local").await;

    for (user_id, title) in [
        (alice_id.as_str(), "For Alice"),
        (bob_id.as_str(), "For Bob"),
        (bob_id.as_str(), "Also for Bob"),
        ("all", "For everyone"),
    ] {
        let (status, _) = app
            .post(
                "/api/notifications",
                ADMIN_KEY,
                json!({ "user_id": user_id, "title": title, "message": "Hello" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app.get("/api/notifications", &alice_key).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|n| n["user_id"] == alice_id));

    let (_, body) = app.get("/api/notifications", &bob_key).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|n| n["user_id"] == bob_id));

    // Admin, Alice and Bob each got the broadcast.
    let (_, body) = app.get("/api/notifications", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}
