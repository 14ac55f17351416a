use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod applicants;
pub mod criteria;
pub mod error;
pub mod health;
pub mod job_offers;
pub mod metrics;
pub mod scores;

/// Build the CRUD API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route(
            "/job_offers",
            get(job_offers::list_job_offers).post(job_offers::create_job_offer),
        )
        .route("/job_offers/{offer_id}", get(job_offers::get_job_offer))
        .route(
            "/job_offers/{offer_id}/applicants",
            get(applicants::list_applicants).post(applicants::create_applicants),
        )
        .route(
            "/job_offers/{offer_id}/criteria",
            get(criteria::get_criteria).post(criteria::add_criteria),
        )
        .route(
            "/job_offers/{offer_id}/criteria/{criterion_id}",
            axum::routing::put(criteria::update_criterion),
        )
        .route(
            "/job_offers/{offer_id}/applicants/{applicant_id}/scores",
            get(scores::get_applicant_scores),
        )
        .route(
            "/job_offers/{offer_id}/applicants/{applicant_id}/scores/{criterion_id}",
            get(scores::get_applicant_score).put(scores::update_applicant_score),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024)) // 2 MB limit
}
