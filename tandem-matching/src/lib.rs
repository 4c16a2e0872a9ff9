use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

pub mod config;
pub mod matching;
pub mod models;
pub mod routes;
pub mod schema;
pub mod scheduling;
pub mod storage;

use storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub metrics_handle: PrometheusHandle,
}

/// All service routes. Layers (CORS, tracing, metrics) are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Matching
        .route("/matches", get(routes::matches::find_matches))
        // Meetings
        .route("/meetings", get(routes::meetings::list_meetings))
        .route("/meetings/schedule", post(routes::meetings::schedule_meeting))
        .route("/meetings/:id", delete(routes::meetings::cancel_meeting))
        // Availability
        .route(
            "/availability",
            get(routes::availability::list_availability)
                .post(routes::availability::add_availability)
                .put(routes::availability::replace_availability),
        )
        .route("/availability/:id", delete(routes::availability::remove_availability))
        // Friends
        .route("/friends", get(routes::friends::list_friends))
        .route("/friends/:id", post(routes::friends::add_friend))
        // Interests
        .route(
            "/interests",
            get(routes::interests::list_interests)
                .post(routes::interests::add_interest)
                .put(routes::interests::replace_interests),
        )
        .route("/interests/catalog", get(routes::interests::list_catalog))
        .route("/interests/:id", delete(routes::interests::remove_interest))
        .with_state(state)
}
