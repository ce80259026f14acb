//! CSV export and import.

mod common;

use axum::http::StatusCode;
use common::{ADMIN_KEY, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_export_has_header_plus_one_line_per_row() {
    let app = spawn_app().await;
    app.create_computer("PC-20", "Alpha").await;
    app.create_computer("PC-21", "Beta").await;
    app.create_computer("PC-22", "Gamma").await;

    let (status, csv) = app.request_text("/api/export/computers", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::OK);

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);

    let columns = lines[0].split(',').count();
    assert!(lines[0].starts_with("id,"));
    for line in &lines[1..] {
        assert_eq!(line.split(',').count(), columns);
        assert!(line.starts_with('"') && line.ends_with('"'));
    }
    assert!(csv.contains("\"PC-21\""));
}

#[tokio::test]
async fn test_export_flattens_related_rows() {
    let app = spawn_app().await;
    let computer_id = app.create_computer("PC-23", "Delta").await;
    let (_, student_key) = app.register_student("export@lab.local").await;

    app.post(
        "/api/bookings",
        &student_key,
        json!({
            "computer_id": computer_id,
            "start_time": "2030-07-01T10:00:00Z",
            "end_time": "2030-07-01T11:00:00Z",
        }),
    )
    .await;

    let (status, csv) = app.request_text("/api/export/bookings", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::OK);

    let header: Vec<&str> = csv.lines().next().unwrap().split(',').collect();
    assert!(header.contains(&"computers_name"));
    assert!(header.contains(&"profiles_full_name"));
    assert!(csv.contains("\"Delta\""));
}

#[tokio::test]
async fn test_empty_export_and_student_export_rejected() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/export/software", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No data to export"));

    let (status, _) = app.get("/api/export/everything", ADMIN_KEY).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, student_key) = app.register_student("csv@lab.local").await;
    let (status, _) = app.get("/api/export/computers", &student_key).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_import_computers_inserts_every_row() {
    let app = spawn_app().await;

    let csv = "system_id, name, location, ignored\nPC-30,Lab PC 30,Room 1,x\n\nPC-31,Lab PC 31,Room 2,y\n";
    let (status, body) = app
        .post("/api/import", ADMIN_KEY, json!({ "type": "computers", "csv": csv }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["imported"], 2);

    let (_, body) = app.get("/api/computers", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_import_is_all_or_nothing() {
    let app = spawn_app().await;
    app.create_computer("PC-40", "Existing").await;

    // Second row repeats an existing system id.
    let csv = "system_id,name\nPC-41,Fresh\nPC-40,Clash\n";
    let (status, _) = app
        .post("/api/import", ADMIN_KEY, json!({ "type": "computers", "csv": csv }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Missing a required column.
    let csv = "system_id,location\nPC-42,Room 9\n";
    let (status, _) = app
        .post("/api/import", ADMIN_KEY, json!({ "type": "computers", "csv": csv }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/computers", ADMIN_KEY).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
