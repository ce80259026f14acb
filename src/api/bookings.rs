use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, BookingListQuery, BookingStatusRequest};
use crate::entities::bookings;
use crate::services::Actor;
use crate::services::booking_service::{BookingCreated, BookingRequest, BookingView};

/// GET /bookings
///
/// Students only ever see their own bookings.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Vec<BookingView>>>, ApiError> {
    let bookings = state
        .shared
        .booking_service
        .list(&actor, query.status)
        .await?;
    Ok(Json(ApiResponse::success(bookings)))
}

/// GET /bookings/{id}
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<bookings::Model>>, ApiError> {
    let id = validate_id("booking", &id)?;
    let booking = state.shared.booking_service.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

/// POST /bookings
///
/// Always creates a `pending` booking. Overlapping bookings are reported in
/// `conflicts` unless the overlap policy rejects them.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<ApiResponse<BookingCreated>>, ApiError> {
    let created = state
        .shared
        .booking_service
        .create(&actor, request)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// PUT /bookings/{id}/status
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<BookingStatusRequest>,
) -> Result<Json<ApiResponse<bookings::Model>>, ApiError> {
    let id = validate_id("booking", &id)?;
    let booking = state
        .shared
        .booking_service
        .transition(&actor, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(booking)))
}
