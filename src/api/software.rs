use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, AssignSoftwareRequest, MessageResponse};
use crate::db::repositories::software::{NewSoftware, SoftwareChanges};
use crate::entities::{computer_software, software};
use crate::services::Actor;
use crate::services::software::SoftwareWithInstalls;

/// GET /software
pub async fn list_software(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SoftwareWithInstalls>>>, ApiError> {
    let software = state.shared.software.list().await?;
    Ok(Json(ApiResponse::success(software)))
}

/// GET /software/{id}
pub async fn get_software(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<software::Model>>, ApiError> {
    let id = validate_id("software", &id)?;
    let software = state.shared.software.get(id).await?;
    Ok(Json(ApiResponse::success(software)))
}

/// POST /software
pub async fn create_software(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewSoftware>,
) -> Result<Json<ApiResponse<software::Model>>, ApiError> {
    let software = state.shared.software.create(&actor, input).await?;
    Ok(Json(ApiResponse::success(software)))
}

/// PUT /software/{id}
pub async fn update_software(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(changes): Json<SoftwareChanges>,
) -> Result<Json<ApiResponse<software::Model>>, ApiError> {
    let id = validate_id("software", &id)?;
    let software = state.shared.software.update(&actor, id, changes).await?;
    Ok(Json(ApiResponse::success(software)))
}

/// DELETE /software/{id}
///
/// Installation rows go with it.
pub async fn delete_software(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("software", &id)?;
    let removed = state.shared.software.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Software deleted ({removed} installations removed)"
    )))))
}

/// GET /software/{id}/installations
pub async fn list_installations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<computer_software::Model>>>, ApiError> {
    let id = validate_id("software", &id)?;
    let installations = state.shared.software.installations(id).await?;
    Ok(Json(ApiResponse::success(installations)))
}

/// POST /software/{id}/installations
pub async fn assign_software(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<AssignSoftwareRequest>,
) -> Result<Json<ApiResponse<computer_software::Model>>, ApiError> {
    let id = validate_id("software", &id)?;
    let computer_id = validate_id("computer", &payload.computer_id)?;
    let installation = state
        .shared
        .software
        .assign(&actor, id, computer_id)
        .await?;
    Ok(Json(ApiResponse::success(installation)))
}

/// DELETE /software/{id}/installations/{computer_id}
pub async fn unassign_software(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((id, computer_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("software", &id)?;
    let computer_id = validate_id("computer", &computer_id)?;
    state
        .shared
        .software
        .unassign(&actor, id, computer_id)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Software removed from computer",
    ))))
}
