use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, options, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::domain::events::LabEvent;
use crate::state::SharedState;

pub mod auth;
mod bookings;
mod computers;
mod error;
pub mod events;
mod functions;
mod issues;
mod maintenance;
mod notices;
mod notifications;
mod observability;
mod reports;
mod sessions;
mod software;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn event_bus(&self) -> &broadcast::Sender<LabEvent> {
        &self.shared.event_bus
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, idle_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_idle_minutes,
        )
    };

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(idle_minutes)));

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .layer(session_layer.clone())
        .with_state(state.clone());

    let functions_router = Router::new()
        .route("/delete-account", post(functions::delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .route("/delete-account", options(functions::preflight))
        .route(
            "/cleanup-old-issues",
            post(functions::cleanup_old_issues).options(functions::preflight),
        )
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    // `/functions` answers its own preflight with fixed headers, so it sits
    // outside the CORS layer.
    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .nest("/functions", functions_router)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/me", put(auth::update_profile))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/computers", get(computers::list_computers))
        .route("/computers", post(computers::create_computer))
        .route("/computers/{id}", get(computers::get_computer))
        .route("/computers/{id}", put(computers::update_computer))
        .route("/computers/{id}", delete(computers::delete_computer))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/{id}", get(bookings::get_booking))
        .route(
            "/bookings/{id}/status",
            put(bookings::update_booking_status),
        )
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions", post(sessions::start_session))
        .route("/sessions/{id}/end", post(sessions::end_session))
        .route(
            "/sessions/attendance/{user_id}",
            get(sessions::get_attendance),
        )
        .route("/issues", get(issues::list_issues))
        .route("/issues", post(issues::report_issue))
        .route("/issues/{id}", get(issues::get_issue))
        .route("/issues/{id}/status", put(issues::update_issue_status))
        .route("/software", get(software::list_software))
        .route("/software", post(software::create_software))
        .route("/software/{id}", get(software::get_software))
        .route("/software/{id}", put(software::update_software))
        .route("/software/{id}", delete(software::delete_software))
        .route(
            "/software/{id}/installations",
            get(software::list_installations),
        )
        .route(
            "/software/{id}/installations",
            post(software::assign_software),
        )
        .route(
            "/software/{id}/installations/{computer_id}",
            delete(software::unassign_software),
        )
        .route("/maintenance", get(maintenance::list_maintenance))
        .route("/maintenance", post(maintenance::create_maintenance))
        .route(
            "/maintenance/{id}/complete",
            post(maintenance::complete_maintenance),
        )
        .route("/notices", get(notices::list_notices))
        .route("/notices", post(notices::create_notice))
        .route("/notices/{id}", put(notices::update_notice))
        .route("/notices/{id}", delete(notices::delete_notice))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications", post(notifications::send_notification))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route(
            "/notifications/{id}",
            delete(notifications::delete_notification),
        )
        .route("/users", get(users::list_users))
        .route("/users/{id}/role", put(users::set_role))
        .route("/reminders", get(reports::get_reminders))
        .route("/dashboard/summary", get(reports::get_summary))
        .route("/dashboard/reports", get(reports::get_report))
        .route("/export/{kind}", get(reports::export_csv))
        .route("/import", post(reports::import_csv))
        .route("/system/status", get(system::get_status))
        .route("/system/config", get(system::get_config))
        .route("/system/logs", get(system::get_logs))
        .route("/system/logs", delete(system::clear_logs))
        .route("/metrics", get(observability::get_metrics))
        .merge(events::router())
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
