//! Authentication, health and role enforcement over HTTP.

mod common;

use axum::http::StatusCode;
use common::{ADMIN_KEY, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let (status, _) = app.request("GET", "/api/computers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/computers", "wrong-key").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = app.get("/api/computers", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_checks_are_public() {
    let app = spawn_app().await;

    let (status, body) = app
        .request("GET", "/api/system/health/live", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let (status, body) = app
        .request("GET", "/api/system/health/ready", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ready"], true);
}

#[tokio::test]
async fn test_register_then_login() {
    let app = spawn_app().await;
    let (user_id, api_key) = app.register_student("ada@lab.local").await;

    let (status, body) = app.get("/api/auth/me", &api_key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id);
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["profile"]["full_name"], "Student ada@lab.local");

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@lab.local", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["api_key"], api_key);

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@lab.local", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app().await;
    app.register_student("dup@lab.local").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "dup@lab.local",
                "password": "another-password",
                "full_name": "Someone Else",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registration_can_be_disabled() {
    let app = common::spawn_app_with(|config| {
        config.security.allow_self_registration = false;
    })
    .await;

    let (status, _) = app
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "closed@lab.local",
                "password": "correct-horse",
                "full_name": "Closed",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_regenerated_key_replaces_old_one() {
    let app = spawn_app().await;
    let (_, old_key) = app.register_student("keys@lab.local").await;

    let (status, body) = app
        .post("/api/auth/api-key/regenerate", &old_key, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["data"]["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    let (status, _) = app.get("/api/auth/me", &old_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/auth/me", &new_key).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_students_cannot_manage_computers() {
    let app = spawn_app().await;
    let (_, student_key) = app.register_student("nope@lab.local").await;

    let (status, _) = app
        .post(
            "/api/computers",
            &student_key,
            json!({ "system_id": "PC-01", "name": "Front row" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let computer_id = app.create_computer("PC-01", "Front row").await;

    let (status, _) = app
        .delete(&format!("/api/computers/{computer_id}"), &student_key)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/computers", &student_key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/users", &student_key).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/system/logs", &student_key).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_system_id_conflicts() {
    let app = spawn_app().await;
    app.create_computer("PC-07", "Window seat").await;

    let (status, _) = app
        .post(
            "/api/computers",
            ADMIN_KEY,
            json!({ "system_id": "PC-07", "name": "Another" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let app = spawn_app().await;

    let (status, _) = app.get("/api/computers/not-a-uuid", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .get(&format!("/api/computers/{missing}"), ADMIN_KEY)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_can_promote_but_not_demote_last_admin() {
    let app = spawn_app().await;
    let (student_id, student_key) = app.register_student("promote@lab.local").await;

    let (status, _) = app
        .put(
            &format!("/api/users/{student_id}/role"),
            ADMIN_KEY,
            json!({ "role": "lab_staff" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/auth/me", &student_key).await;
    assert_eq!(body["data"]["role"], "lab_staff");

    let admin_id = app.admin_id().await;
    let (status, _) = app
        .put(
            &format!("/api/users/{admin_id}/role"),
            ADMIN_KEY,
            json!({ "role": "student" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = spawn_app().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/computers")
                .header("X-Api-Key", ADMIN_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["cache-control"], "no-store");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_metrics_require_a_caller() {
    let app = spawn_app().await;

    let (status, _) = app.request("GET", "/api/metrics", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/metrics", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::OK);
    // Not JSON, so the helper hands back Null.
    assert!(body.is_null());
}
