//! System endpoints: health probes, status, configuration and logs.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::config::Config;
use crate::domain::booking::OverlapPolicy;
use crate::services::Actor;

pub mod logs;
pub use logs::{clear_logs, get_logs};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub event_subscribers: usize,
    pub cleanup_enabled: bool,
    pub overlap_policy: OverlapPolicy,
}

/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    actor.require_staff()?;

    let (cleanup_enabled, overlap_policy) = {
        let config = state.config().read().await;
        (
            config.cleanup.enabled,
            config.booking.overlap_policy,
        )
    };

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        event_subscribers: state.event_bus().receiver_count(),
        cleanup_enabled,
        overlap_policy,
    })))
}

/// `GET /api/system/config`
///
/// Admin only.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Config>>, ApiError> {
    actor.require_admin()?;
    let config = state.shared.config().await;
    Ok(Json(ApiResponse::success(config)))
}

/// `GET /api/system/health/live`
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// `GET /api/system/health/ready`
///
/// Ready once the database answers.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready: database,
            database,
        })),
    )
        .into_response()
}
