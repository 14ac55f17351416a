use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(db: PgPool, metrics: PrometheusHandle) -> Self {
        Self { db, metrics }
    }
}
