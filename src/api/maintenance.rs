use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MaintenanceListQuery};
use crate::db::repositories::maintenance::NewMaintenance;
use crate::entities::maintenance_logs;
use crate::services::Actor;
use crate::services::maintenance::MaintenanceView;

/// GET /maintenance
pub async fn list_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MaintenanceListQuery>,
) -> Result<Json<ApiResponse<Vec<MaintenanceView>>>, ApiError> {
    let computer_id = match query.computer_id.as_deref() {
        Some(id) => Some(validate_id("computer", id)?),
        None => None,
    };
    let logs = state.shared.maintenance.list(&actor, computer_id).await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// POST /maintenance
pub async fn create_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewMaintenance>,
) -> Result<Json<ApiResponse<maintenance_logs::Model>>, ApiError> {
    let log = state.shared.maintenance.create(&actor, input).await?;
    Ok(Json(ApiResponse::success(log)))
}

/// POST /maintenance/{id}/complete
pub async fn complete_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<maintenance_logs::Model>>, ApiError> {
    let id = validate_id("maintenance log", &id)?;
    let log = state.shared.maintenance.complete(&actor, id).await?;
    Ok(Json(ApiResponse::success(log)))
}
