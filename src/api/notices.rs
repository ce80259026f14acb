use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::repositories::notice::{NewNotice, NoticeChanges};
use crate::entities::lab_notices;
use crate::services::Actor;

/// GET /notices
///
/// Staff see every notice; everyone else only active, unexpired ones.
pub async fn list_notices(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<lab_notices::Model>>>, ApiError> {
    let notices = state.shared.notices.list(&actor).await?;
    Ok(Json(ApiResponse::success(notices)))
}

pub async fn create_notice(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewNotice>,
) -> Result<Json<ApiResponse<lab_notices::Model>>, ApiError> {
    let notice = state.shared.notices.create(&actor, input).await?;
    Ok(Json(ApiResponse::success(notice)))
}

pub async fn update_notice(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(changes): Json<NoticeChanges>,
) -> Result<Json<ApiResponse<lab_notices::Model>>, ApiError> {
    let id = validate_id("notice", &id)?;
    let notice = state.shared.notices.update(&actor, id, changes).await?;
    Ok(Json(ApiResponse::success(notice)))
}

pub async fn delete_notice(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("notice", &id)?;
    state.shared.notices.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Notice deleted",
    ))))
}
