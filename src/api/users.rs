use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse, SetRoleRequest};
use crate::services::Actor;
use crate::services::users::ProfileWithRole;

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<ProfileWithRole>>>, ApiError> {
    let users = state.shared.users.list(&actor).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// PUT /users/{id}/role
///
/// Admin only. The last admin cannot be demoted.
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("user", &id)?;
    state.shared.users.set_role(&actor, id, payload.role).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Role set to {}",
        payload.role.as_str()
    )))))
}
