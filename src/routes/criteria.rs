use axum::extract::{Path, State};
use axum::Json;
use garde::Validate;

use super::error::ApiError;
use super::job_offers::require_offer;
use crate::app_state::AppState;
use crate::db::queries;
use crate::models::criterion::{
    AddCriteriaRequest, AddCriteriaResponse, GetCriteriaResponse, UpdateCriterionRequest,
    UpdateCriterionResponse,
};

/// GET /job_offers/{offer_id}/criteria
pub async fn get_criteria(
    State(state): State<AppState>,
    Path(offer_id): Path<i32>,
) -> Result<Json<GetCriteriaResponse>, ApiError> {
    require_offer(&state, offer_id).await?;
    let criteria = queries::list_criteria(&state.db, offer_id).await?;
    Ok(Json(GetCriteriaResponse { criteria }))
}

/// POST /job_offers/{offer_id}/criteria
pub async fn add_criteria(
    State(state): State<AppState>,
    Path(offer_id): Path<i32>,
    Json(request): Json<AddCriteriaRequest>,
) -> Result<Json<AddCriteriaResponse>, ApiError> {
    request.validate()?;
    require_offer(&state, offer_id).await?;

    let criteria = queries::add_criteria(&state.db, offer_id, &request.criteria).await?;
    metrics::counter!("api_criteria_created_total").increment(criteria.len() as u64);

    Ok(Json(AddCriteriaResponse {
        message: "Criteria added successfully".to_string(),
        criteria,
    }))
}

/// PUT /job_offers/{offer_id}/criteria/{criterion_id}
///
/// Changing the description drops the criterion's scores so the evaluator recomputes them.
pub async fn update_criterion(
    State(state): State<AppState>,
    Path((offer_id, criterion_id)): Path<(i32, i32)>,
    Json(request): Json<UpdateCriterionRequest>,
) -> Result<Json<UpdateCriterionResponse>, ApiError> {
    request.validate()?;
    require_offer(&state, offer_id).await?;

    let criterion = queries::update_criterion(
        &state.db,
        offer_id,
        criterion_id,
        request.description.as_deref(),
        request.importance,
    )
    .await?
    .ok_or(ApiError::NotFound("Criterion not found"))?;
    metrics::counter!("api_criteria_updated_total").increment(1);

    Ok(Json(UpdateCriterionResponse {
        message: "Updated successfully".to_string(),
        criterion,
    }))
}
