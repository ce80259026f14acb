//! Dashboard, reminders and CSV transfer endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ImportRequest, ReportQuery};
use crate::services::Actor;
use crate::services::dashboard::{Report, Summary};
use crate::services::reminders::Reminders;
use crate::services::transfer::{ExportKind, ImportKind, ImportSummary};

/// GET /dashboard/summary
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    let summary = state.shared.dashboard.summary(&actor).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// GET /dashboard/reports?from=&to=
///
/// Defaults to the last 30 days.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<Report>>, ApiError> {
    let report = state
        .shared
        .dashboard
        .report(&actor, query.from.as_deref(), query.to.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// GET /reminders
pub async fn get_reminders(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Reminders>>, ApiError> {
    let reminders = state.shared.reminders.collect(&actor).await?;
    Ok(Json(ApiResponse::success(reminders)))
}

/// GET /export/{kind}
///
/// Returns a CSV attachment named `<kind>_<date>.csv`.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let kind: ExportKind = kind.parse()?;
    let csv = state.shared.transfer.export(&actor, kind).await?;

    let disposition = format!(
        "attachment; filename=\"{}_{}.csv\"",
        kind.file_stem(),
        Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// POST /import
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let kind: ImportKind = payload.kind.parse()?;
    let summary = state
        .shared
        .transfer
        .import(&actor, kind, &payload.csv)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}
