use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, ComputerListQuery, MessageResponse};
use crate::db::repositories::computer::{ComputerChanges, NewComputer};
use crate::entities::computers;
use crate::services::Actor;

/// GET /computers
pub async fn list_computers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ComputerListQuery>,
) -> Result<Json<ApiResponse<Vec<computers::Model>>>, ApiError> {
    let computers = state.shared.computers.list(query.status).await?;
    Ok(Json(ApiResponse::success(computers)))
}

/// GET /computers/{id}
pub async fn get_computer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<computers::Model>>, ApiError> {
    let id = validate_id("computer", &id)?;
    let computer = state.shared.computers.get(id).await?;
    Ok(Json(ApiResponse::success(computer)))
}

/// POST /computers
pub async fn create_computer(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewComputer>,
) -> Result<Json<ApiResponse<computers::Model>>, ApiError> {
    let computer = state.shared.computers.create(&actor, input).await?;
    Ok(Json(ApiResponse::success(computer)))
}

/// PUT /computers/{id}
pub async fn update_computer(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(changes): Json<ComputerChanges>,
) -> Result<Json<ApiResponse<computers::Model>>, ApiError> {
    let id = validate_id("computer", &id)?;
    let computer = state.shared.computers.update(&actor, id, changes).await?;
    Ok(Json(ApiResponse::success(computer)))
}

/// DELETE /computers/{id}
pub async fn delete_computer(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("computer", &id)?;
    state.shared.computers.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Computer deleted",
    ))))
}
