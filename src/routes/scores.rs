use axum::extract::{Path, State};
use axum::Json;
use garde::Validate;

use super::error::ApiError;
use super::job_offers::require_offer;
use crate::app_state::AppState;
use crate::db::queries;
use crate::models::score::{GetScoreResponse, GetScoresResponse, UpdateScoreRequest};

async fn require_applicant(
    state: &AppState,
    offer_id: i32,
    applicant_id: i32,
) -> Result<(), ApiError> {
    require_offer(state, offer_id).await?;
    queries::get_applicant(&state.db, offer_id, applicant_id)
        .await?
        .ok_or(ApiError::NotFound("Applicant not found"))?;
    Ok(())
}

async fn require_pair(
    state: &AppState,
    offer_id: i32,
    applicant_id: i32,
    criterion_id: i32,
) -> Result<(), ApiError> {
    require_applicant(state, offer_id, applicant_id).await?;
    queries::get_criterion(&state.db, offer_id, criterion_id)
        .await?
        .ok_or(ApiError::NotFound("Criterion not found"))?;
    Ok(())
}

/// GET /job_offers/{offer_id}/applicants/{applicant_id}/scores
pub async fn get_applicant_scores(
    State(state): State<AppState>,
    Path((offer_id, applicant_id)): Path<(i32, i32)>,
) -> Result<Json<GetScoresResponse>, ApiError> {
    require_applicant(&state, offer_id, applicant_id).await?;

    let scores = queries::list_scores(&state.db, applicant_id).await?;
    if scores.is_empty() {
        return Err(ApiError::NotFound("Scores not found for the applicant"));
    }
    Ok(Json(GetScoresResponse { scores }))
}

/// GET /job_offers/{offer_id}/applicants/{applicant_id}/scores/{criterion_id}
pub async fn get_applicant_score(
    State(state): State<AppState>,
    Path((offer_id, applicant_id, criterion_id)): Path<(i32, i32, i32)>,
) -> Result<Json<GetScoreResponse>, ApiError> {
    require_pair(&state, offer_id, applicant_id, criterion_id).await?;

    let score = queries::get_score(&state.db, applicant_id, criterion_id)
        .await?
        .ok_or(ApiError::NotFound("Score has not been computed yet"))?;
    Ok(Json(GetScoreResponse { score }))
}

/// PUT /job_offers/{offer_id}/applicants/{applicant_id}/scores/{criterion_id}
///
/// Only overwrites; scores are created by the evaluator.
pub async fn update_applicant_score(
    State(state): State<AppState>,
    Path((offer_id, applicant_id, criterion_id)): Path<(i32, i32, i32)>,
    Json(request): Json<UpdateScoreRequest>,
) -> Result<Json<GetScoreResponse>, ApiError> {
    request.validate()?;
    require_pair(&state, offer_id, applicant_id, criterion_id).await?;

    let score = queries::update_score(&state.db, applicant_id, criterion_id, request.score)
        .await?
        .ok_or(ApiError::NotFound("Score has not been computed yet"))?;
    metrics::counter!("api_scores_updated_total").increment(1);

    Ok(Json(GetScoreResponse { score }))
}
