use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::SESSION_USER_KEY;
use crate::db::repositories::profile::ProfileChanges;
use crate::entities::profiles;
use crate::services::{Actor, LoginResult, Registration, UserInfo};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller and stores it as an [`Actor`] request extension.
///
/// Checked in order:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth = &state.shared.auth_service;

    if let Ok(Some(user_id)) = session.get::<String>(SESSION_USER_KEY).await {
        if let Some(actor) = auth.actor_for_user(&user_id).await? {
            tracing::Span::current().record("user_id", &actor.user_id);
            request.extensions_mut().insert(actor);
            return Ok(next.run(request).await);
        }
        // Account is gone; drop the stale session.
        let _ = session.flush().await;
    }

    if let Some(key) = extract_api_key(&headers) {
        if let Some(actor) = auth.actor_for_api_key(&key).await? {
            tracing::Span::current().record("user_id", &actor.user_id);
            request.extensions_mut().insert(actor);
            return Ok(next.run(request).await);
        }
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

async fn start_session(session: &Session, user_id: &str) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Self-registration as a student. Logs the new account in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<Registration>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let result = state.shared.auth_service.register(payload).await?;
    start_session(&session, &result.user_id).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/login
/// Authenticate with email and password, returns the API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .shared
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    start_session(&session, &result.user_id).await?;
    tracing::info!(event = "login", user_id = %result.user_id, "User logged in");

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state
        .shared
        .auth_service
        .get_user_info(&actor.user_id)
        .await?;
    Ok(Json(ApiResponse::success(info)))
}

/// PUT /auth/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<ApiResponse<profiles::Model>>, ApiError> {
    let profile = state
        .shared
        .users
        .update_own_profile(&actor, changes)
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth_service
        .change_password(
            &actor.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.shared.auth_service.get_api_key(&actor.user_id).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state
        .shared
        .auth_service
        .regenerate_api_key(&actor.user_id)
        .await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer  abc123 "));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("abc123"));

        headers.insert("X-Api-Key", HeaderValue::from_static("from-header"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-header"));

        let mut basic = HeaderMap::new();
        basic.insert("Authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_api_key(&basic), None);
    }
}
