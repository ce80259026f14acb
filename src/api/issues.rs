use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, IssueListQuery};
use crate::entities::issues;
use crate::services::Actor;
use crate::services::issue_service::{IssueReport, IssueStatusUpdate, IssueView};

/// GET /issues
pub async fn list_issues(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<IssueListQuery>,
) -> Result<Json<ApiResponse<Vec<IssueView>>>, ApiError> {
    let issues = state.shared.issue_service.list(&actor, query.status).await?;
    Ok(Json(ApiResponse::success(issues)))
}

/// GET /issues/{id}
pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<issues::Model>>, ApiError> {
    let id = validate_id("issue", &id)?;
    let issue = state.shared.issue_service.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(issue)))
}

/// POST /issues
pub async fn report_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(report): Json<IssueReport>,
) -> Result<Json<ApiResponse<issues::Model>>, ApiError> {
    let issue = state.shared.issue_service.report(&actor, report).await?;
    Ok(Json(ApiResponse::success(issue)))
}

/// PUT /issues/{id}/status
pub async fn update_issue_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(update): Json<IssueStatusUpdate>,
) -> Result<Json<ApiResponse<issues::Model>>, ApiError> {
    let id = validate_id("issue", &id)?;
    let issue = state
        .shared
        .issue_service
        .update_status(&actor, id, update)
        .await?;
    Ok(Json(ApiResponse::success(issue)))
}
