use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use tandem_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Liveness plus a storage round-trip.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let storage = match state.storage.get_account(0) {
        Ok(_) => HealthCheck {
            name: "storage".into(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => HealthCheck {
            name: "storage".into(),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    };

    let response = HealthResponse::healthy("tandem-matching", env!("CARGO_PKG_VERSION")).with_checks(vec![storage]);
    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
