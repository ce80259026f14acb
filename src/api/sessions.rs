use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, SessionListQuery};
use crate::entities::session_logs;
use crate::services::Actor;
use crate::services::session_service::{Attendance, SessionView, StartSession};

/// GET /sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<Vec<SessionView>>>, ApiError> {
    let sessions = state
        .shared
        .session_service
        .list(&actor, query.user_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(sessions)))
}

/// POST /sessions
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<StartSession>,
) -> Result<Json<ApiResponse<session_logs::Model>>, ApiError> {
    let session = state
        .shared
        .session_service
        .start(&actor, request)
        .await?;
    Ok(Json(ApiResponse::success(session)))
}

/// POST /sessions/{id}/end
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<session_logs::Model>>, ApiError> {
    let id = validate_id("session", &id)?;
    let session = state.shared.session_service.end(&actor, id).await?;
    Ok(Json(ApiResponse::success(session)))
}

/// GET /sessions/attendance/{user_id}
pub async fn get_attendance(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Attendance>>, ApiError> {
    let user_id = validate_id("user", &user_id)?;
    let attendance = state
        .shared
        .session_service
        .attendance(&actor, user_id)
        .await?;
    Ok(Json(ApiResponse::success(attendance)))
}
