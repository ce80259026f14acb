//! Endpoints mounted under `/functions`, outside the `/api` envelope.
//!
//! Their response shapes are fixed by existing clients, so they build JSON
//! bodies directly instead of going through [`ApiResponse`](super::ApiResponse).

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::error;

use super::{ApiError, AppState};
use crate::services::Actor;

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

fn cors_headers() -> [(HeaderName, HeaderValue); 2] {
    [
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ),
    ]
}

/// OPTIONS preflight for the functions endpoints.
pub async fn preflight() -> Response {
    (StatusCode::OK, cors_headers(), "ok").into_response()
}

/// POST /functions/cleanup-old-issues
///
/// Deletes issues older than the configured retention. Unauthenticated; the
/// scheduler does the same thing in-process.
pub async fn cleanup_old_issues(State(state): State<Arc<AppState>>) -> Response {
    match state.shared.cleanup.run().await {
        Ok(deleted_count) => (
            StatusCode::OK,
            cors_headers(),
            Json(json!({ "success": true, "deleted_count": deleted_count })),
        )
            .into_response(),
        Err(e) => {
            error!(event = "cleanup_request_failed", error = %e, "Cleanup request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                cors_headers(),
                Json(json!({ "error": "Failed to delete old issues" })),
            )
                .into_response()
        }
    }
}

/// POST /functions/delete-account
///
/// Deletes the caller's account and everything it owns, then ends the session.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    session: Session,
) -> Result<Response, ApiError> {
    let deleted = state.shared.auth_service.delete_account(&actor).await?;
    let _ = session.flush().await;

    Ok((
        StatusCode::OK,
        cors_headers(),
        Json(json!({ "success": true, "deleted": deleted })),
    )
        .into_response())
}
