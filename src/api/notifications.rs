use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::validation::validate_id;
use super::{
    ApiError, ApiResponse, AppState, CountResponse, MessageResponse, NotificationListQuery,
};
use crate::entities::notifications;
use crate::services::Actor;
use crate::services::notifications::NotificationDraft;

#[derive(Debug, Serialize)]
pub struct SentResponse {
    pub sent: usize,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<Vec<notifications::Model>>>, ApiError> {
    let notifications = state
        .shared
        .notifications
        .list(&actor, query.unread_only)
        .await?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.shared.notifications.unread_count(&actor).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// POST /notifications
///
/// Staff only. `user_id: "all"` fans out to every profile.
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(draft): Json<NotificationDraft>,
) -> Result<Json<ApiResponse<SentResponse>>, ApiError> {
    let sent = state.shared.notifications.send(&actor, draft).await?;
    Ok(Json(ApiResponse::success(SentResponse { sent })))
}

/// PUT /notifications/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<notifications::Model>>, ApiError> {
    let id = validate_id("notification", &id)?;
    let notification = state.shared.notifications.mark_read(&actor, id).await?;
    Ok(Json(ApiResponse::success(notification)))
}

/// PUT /notifications/read-all
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.shared.notifications.mark_all_read(&actor).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// DELETE /notifications/{id}
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("notification", &id)?;
    state.shared.notifications.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Notification deleted",
    ))))
}
