//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use labdesk::api::AppState;
use labdesk::config::Config;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub use labdesk::constants::DEFAULT_API_KEY as ADMIN_KEY;

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let db_path =
        std::env::temp_dir().join(format!("labdesk-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    configure(&mut config);

    let state = labdesk::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = labdesk::api::router(state.clone()).await;

    TestApp { state, router }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("X-Api-Key", key);
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Raw body, for non-JSON responses such as CSV exports.
    pub async fn request_text(&self, uri: &str, api_key: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .header("X-Api-Key", api_key)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn get(&self, uri: &str, api_key: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(api_key), None).await
    }

    pub async fn post(&self, uri: &str, api_key: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(api_key), Some(body)).await
    }

    pub async fn put(&self, uri: &str, api_key: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(api_key), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, api_key: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(api_key), None).await
    }

    /// Registers a student and returns `(user_id, api_key)`.
    pub async fn register_student(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "correct-horse",
                    "full_name": format!("Student {email}"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        (
            body["data"]["user_id"].as_str().unwrap().to_string(),
            body["data"]["api_key"].as_str().unwrap().to_string(),
        )
    }

    pub async fn admin_id(&self) -> String {
        let (_, body) = self.get("/api/auth/me", ADMIN_KEY).await;
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn create_computer(&self, system_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/computers",
                ADMIN_KEY,
                json!({ "system_id": system_id, "name": name, "location": "Lab A" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create computer failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
