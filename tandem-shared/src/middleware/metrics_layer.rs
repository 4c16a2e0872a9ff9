use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Route label for requests the router did not match. Keeps random paths out of the label set.
const UNMATCHED_ROUTE: &str = "unmatched";

fn route_label(template: Option<&str>) -> String {
    template.unwrap_or(UNMATCHED_ROUTE).to_string()
}

/// `2xx`, `4xx` and so on.
fn status_class(status: StatusCode) -> String {
    format!("{}xx", status.as_u16() / 100)
}

/// Records `tandem_http_requests_total` and `tandem_http_request_duration_seconds`, labelled by
/// method, route template (`/meetings/:id`, never the concrete path) and status.
pub async fn metrics_middleware(matched_path: Option<MatchedPath>, req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = route_label(matched_path.as_ref().map(MatchedPath::as_str));

    let response = next.run(req).await;
    let status = response.status();

    let labels = [
        ("method", method),
        ("route", route),
        ("status", status.as_u16().to_string()),
        ("class", status_class(status)),
    ];
    counter!("tandem_http_requests_total", &labels).increment(1);
    histogram!("tandem_http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());

    response
}

/// Installs the global Prometheus recorder. Fails if one is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
