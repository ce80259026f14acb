use axum::{
    Extension, Json,
    extract::{Query, State},
};
use std::sync::Arc;

use crate::api::validation::{validate_page, validate_page_size};
use crate::api::{ApiError, ApiResponse, AppState, CountResponse, LogsQuery, LogsResponse};
use crate::constants::limits::DEFAULT_LOG_PAGE_SIZE;
use crate::db::{LogFilter, SystemLog};
use crate::services::Actor;

/// GET /system/logs
///
/// Staff only. Newest first, one page at a time.
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<LogsResponse<SystemLog>>>, ApiError> {
    actor.require_staff()?;

    let page = validate_page(query.page.unwrap_or(1))?;
    let page_size = validate_page_size(query.page_size.unwrap_or(DEFAULT_LOG_PAGE_SIZE))?;

    let filter = LogFilter {
        level: query.level,
        event_type: query.event_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let (logs, total_pages) = state.store().get_logs(page, page_size, filter).await?;

    Ok(Json(ApiResponse::success(LogsResponse {
        logs,
        total_pages,
    })))
}

/// DELETE /system/logs
///
/// Admin only.
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    actor.require_admin()?;
    let count = state.store().clear_logs().await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}
