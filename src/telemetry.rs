//! Logging and metrics set-up shared by the API server and both workers.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::{Ipv4Addr, SocketAddr};
use tracing_subscriber::EnvFilter;

use crate::config::WorkerConfig;

const SCORE_BUCKETS: &[f64] = &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
const COUNT_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0];
const LENGTH_BUCKETS: &[f64] = &[10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0];

/// Initialize structured JSON logging, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}

/// Prometheus builder with the histogram buckets used across the system.
pub fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full("worker_batch_size".to_string()), COUNT_BUCKETS)?
        .set_buckets_for_metric(
            Matcher::Full("worker_time_since_schedule_seconds".to_string()),
            COUNT_BUCKETS,
        )?
        .set_buckets_for_metric(Matcher::Suffix("_value".to_string()), SCORE_BUCKETS)?
        .set_buckets_for_metric(
            Matcher::Full("extractor_criteria_description_length".to_string()),
            LENGTH_BUCKETS,
        )
}

/// Expose worker metrics on `0.0.0.0:{metrics_server_port}` when enabled.
///
/// Without an installed recorder the `metrics` macros are no-ops.
pub fn install_worker_exporter(config: &WorkerConfig) -> Result<(), BuildError> {
    if !config.expose_metrics {
        return Ok(());
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.metrics_server_port));
    prometheus_builder()?.with_http_listener(addr).install()?;
    tracing::info!(%addr, "Prometheus metrics exposed");
    Ok(())
}

pub fn describe_worker_metrics() {
    metrics::describe_histogram!(
        "worker_batch_size",
        "Number of items claimed in a single batch"
    );
    metrics::describe_histogram!(
        "worker_batch_obtaining_duration_seconds",
        "Time spent claiming a batch"
    );
    metrics::describe_histogram!(
        "worker_batch_dispatch_duration_seconds",
        "Time to dispatch a whole batch"
    );
    metrics::describe_histogram!(
        "worker_single_dispatch_duration_seconds",
        "Time to dispatch a single item"
    );
    metrics::describe_counter!("worker_dispatches_total", "Total dispatch attempts");
    metrics::describe_counter!(
        "worker_failed_dispatches_total",
        "Total dispatch attempts that failed"
    );
    metrics::describe_counter!(
        "worker_timeouts_total",
        "Total dispatch attempts that timed out"
    );
    metrics::describe_histogram!(
        "worker_time_since_schedule_seconds",
        "Time between an item becoming schedulable and its result being staged"
    );
    metrics::describe_counter!(
        "extractor_criteria_computed_total",
        "Total criteria computed by the extraction service"
    );
    metrics::describe_histogram!(
        "extractor_criteria_importance_value",
        "Distribution of extracted criteria importance"
    );
    metrics::describe_histogram!(
        "extractor_criteria_description_length",
        "Distribution of extracted criteria description length"
    );
    metrics::describe_counter!(
        "evaluator_scores_computed_total",
        "Total applicant scores computed by the evaluation service"
    );
    metrics::describe_histogram!(
        "evaluator_score_value",
        "Distribution of applicant scores"
    );
}

pub fn describe_api_metrics() {
    metrics::describe_counter!("api_job_offers_created_total", "Job offers created");
    metrics::describe_counter!("api_applicants_created_total", "Applicants created");
    metrics::describe_counter!("api_criteria_created_total", "Criteria added through the API");
    metrics::describe_counter!("api_criteria_updated_total", "Criteria edited through the API");
    metrics::describe_counter!("api_scores_updated_total", "Scores overwritten through the API");
}
