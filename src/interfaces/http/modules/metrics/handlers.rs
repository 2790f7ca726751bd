//! `GET /metrics`, Prometheus text rendered from the global recorder

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    /// `None` when no recorder is installed (tests, `--check`)
    pub handle: Option<PrometheusHandle>,
}

pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    match state.handle {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [("content-type", "text/plain; charset=utf-8")],
            "metrics recorder not installed\n".to_string(),
        ),
    }
}
