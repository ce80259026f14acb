//! Lab sessions, issue workflow and the issue cleanup endpoint.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{ADMIN_KEY, spawn_app};
use labdesk::db::repositories::issue::NewIssue;
use labdesk::domain::{IssuePriority, clock};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_session_end_sets_duration_once() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-10", "Station 10").await;
    let (student_id, student_key) = app.register_student("sess@lab.local").await;

    let (status, _) = app
        .post(
            "/api/sessions",
            &student_key,
            json!({ "computer_id": computer_id, "user_id": student_id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/sessions",
            ADMIN_KEY,
            json!({ "computer_id": computer_id, "user_id": student_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["logout_time"].is_null());
    assert!(body["data"]["duration_minutes"].is_null());
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/sessions/{session_id}/end");
    let (status, body) = app.post(&uri, ADMIN_KEY, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["logout_time"].is_string());
    assert_eq!(body["data"]["duration_minutes"], 0);

    let (status, _) = app.post(&uri, ADMIN_KEY, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .get(
            &format!("/api/sessions/attendance/{student_id}"),
            &student_key,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_days"], 1);
    assert_eq!(body["data"]["sessions"].as_array().unwrap().len(), 1);

    let admin_id = app.admin_id().await;
    let (status, _) = app
        .get(&format!("/api/sessions/attendance/{admin_id}"), &student_key)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_issue_status_moves_forward_only() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-11", "Station 11").await;
    let (student_id, student_key) = app.register_student("reporter@lab.local").await;

    let (status, body) = app
        .post(
            "/api/issues",
            &student_key,
            json!({
                "computer_id": computer_id,
                "title": "Monitor flickers",
                "description": "Flickers every few seconds",
                "priority": "high",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["reported_by"], student_id);
    let issue_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/issues/{issue_id}/status");

    let (status, _) = app
        .put(&uri, &student_key, json!({ "status": "resolved" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &uri,
            ADMIN_KEY,
            json!({ "status": "resolved", "resolution_notes": "Replaced cable" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "resolved");
    assert!(body["data"]["resolved_at"].is_string());
    assert_eq!(body["data"]["resolved_by"], app.admin_id().await);

    let (status, _) = app
        .put(&uri, ADMIN_KEY, json!({ "status": "in_progress" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/api/notifications", &student_key).await;
    assert_eq!(body["data"][0]["type"], "issue");
}

#[tokio::test]
async fn test_students_only_see_their_own_issues() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-12", "Station 12").await;
    let (_, alice_key) = app.register_student("alice-issues@lab.local").await;
    let (_, bob_key) = app.register_student("bob-issues@lab.local").await;

    let (_, alice_issue) = app
        .post(
            "/api/issues",
            &alice_key,
            json!({ "computer_id": computer_id, "title": "No sound", "description": "Speakers dead" }),
        )
        .await;

    let (_, body) = app.get("/api/issues", &bob_key).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/issues", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["computer_name"], "Station 12");

    let issue_id = alice_issue["data"]["id"].as_str().unwrap();
    let (status, _) = app.get(&format!("/api/issues/{issue_id}"), &bob_key).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_deletes_only_issues_past_retention() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-13", "Station 13").await;
    let admin_id = app.admin_id().await;
    let issues = app.state.store().issues();

    let now = Utc::now();
    let old = issues
        .create(NewIssue {
            computer_id: computer_id.clone(),
            reported_by: admin_id.clone(),
            title: "Old".to_string(),
            description: "Filed 31 minutes ago".to_string(),
            priority: IssuePriority::Low,
            created_at: clock::stamp(now - Duration::minutes(31)),
        })
        .await
        .unwrap();
    let recent = issues
        .create(NewIssue {
            computer_id,
            reported_by: admin_id,
            title: "Recent".to_string(),
            description: "Filed 29 minutes ago".to_string(),
            priority: IssuePriority::Low,
            created_at: clock::stamp(now - Duration::minutes(29)),
        })
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/functions/cleanup-old-issues")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );

    let (_, body) = app.get("/api/issues", ADMIN_KEY).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![recent.id.as_str()]);
    assert!(!ids.contains(&old.id.as_str()));
}

#[tokio::test]
async fn test_cleanup_preflight() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/functions/cleanup-old-issues")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-headers"],
        "authorization, x-client-info, apikey, content-type"
    );
}

#[tokio::test]
async fn test_students_only_see_their_own_sessions() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-14", "Station 14").await;
    let (alice_id, alice_key) = app.register_student("alice-sess@lab.local").await;
    let (bob_id, bob_key) = app.register_student("bob-sess@lab.local").await;

    for user_id in [&alice_id, &bob_id, &bob_id] {
        let (status, _) = app
            .post(
                "/api/sessions",
                ADMIN_KEY,
                json!({ "computer_id": computer_id, "user_id": user_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get("/api/sessions", &alice_key).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows.iter().all(|s| s["user_id"] == alice_id));

    // Asking for someone else's rows still yields only the caller's.
    let (_, body) = app
        .get(&format!("/api/sessions?user_id={bob_id}"), &alice_key)
        .await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["user_id"] == alice_id)
    );

    let (_, body) = app.get("/api/sessions", &bob_key).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|s| s["user_id"] == bob_id));

    let (_, body) = app.get("/api/sessions", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}
