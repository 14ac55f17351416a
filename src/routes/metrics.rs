use axum::extract::State;
use axum::response::IntoResponse;

use crate::app_state::AppState;

/// GET /metrics: Prometheus text exposition of the API counters.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}
