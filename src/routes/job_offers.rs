use axum::extract::{Path, Query, State};
use axum::Json;
use garde::Validate;

use super::error::ApiError;
use crate::app_state::AppState;
use crate::db::queries;
use crate::models::job_offer::{
    CreateJobOfferRequest, CreateJobOfferResponse, GetJobOfferResponse, JobOffer,
    ListJobOffersQuery, ListJobOffersResponse,
};

/// POST /job_offers: queue a job offer for criteria extraction.
pub async fn create_job_offer(
    State(state): State<AppState>,
    Json(request): Json<CreateJobOfferRequest>,
) -> Result<Json<CreateJobOfferResponse>, ApiError> {
    request.validate()?;

    let job_offer = queries::create_job_offer(&state.db, &request.text).await?;
    metrics::counter!("api_job_offers_created_total").increment(1);
    tracing::info!(offer_id = job_offer.id, "Job offer created");

    Ok(Json(CreateJobOfferResponse {
        message: "Created successfully".to_string(),
        job_offer,
    }))
}

/// GET /job_offers
pub async fn list_job_offers(
    State(state): State<AppState>,
    Query(query): Query<ListJobOffersQuery>,
) -> Result<Json<ListJobOffersResponse>, ApiError> {
    query.validate()?;

    let job_offers = queries::list_job_offers(
        &state.db,
        query.text.as_deref(),
        query.status,
        query.limit,
        query.offset,
    )
    .await?;
    let cursor = query.offset + job_offers.len() as i64;

    Ok(Json(ListJobOffersResponse { job_offers, cursor }))
}

/// GET /job_offers/{offer_id}
pub async fn get_job_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<i32>,
) -> Result<Json<GetJobOfferResponse>, ApiError> {
    let job_offer = require_offer(&state, offer_id).await?;
    Ok(Json(GetJobOfferResponse { job_offer }))
}

/// Looks up the offer a nested route hangs off.
pub(super) async fn require_offer(state: &AppState, offer_id: i32) -> Result<JobOffer, ApiError> {
    queries::get_job_offer(&state.db, offer_id)
        .await?
        .ok_or(ApiError::NotFound("Offer not found"))
}
