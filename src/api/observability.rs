use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::api::AppState;

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Wraps every request in a `request` span and records the HTTP metrics.
///
/// `user_id` is filled in by the auth middleware once the caller is known.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        route = matched_path.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status().as_u16();

        let outcome = outcome(status);

        // Unmatched paths share one label so probing cannot grow the series.
        let labels = [
            ("method", method.clone()),
            ("route", matched_path.clone().unwrap_or_else(|| "unmatched".to_string())),
            ("outcome", outcome.to_string()),
        ];

        metrics::counter!("labdesk_http_requests_total", &labels).increment(1);
        metrics::histogram!("labdesk_http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());
        if status == 403 {
            metrics::counter!("labdesk_access_denied_total", "route" => labels[1].1.clone())
                .increment(1);
        }

        info!(
            event = "http_request_finished",
            duration_ms = duration_ms,
            status_code = status,
            user_agent = %user_agent,
            outcome = %outcome,
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

const fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        401 | 403 => "denied",
        400..=499 => "client_error",
        _ => "success",
    }
}

/// Responses carry per-user lab data, so nothing may be cached.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_separates_denied_requests() {
        assert_eq!(outcome(200), "success");
        assert_eq!(outcome(409), "client_error");
        assert_eq!(outcome(401), "denied");
        assert_eq!(outcome(403), "denied");
        assert_eq!(outcome(503), "error");
    }
}
