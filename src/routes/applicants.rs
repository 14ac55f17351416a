use axum::extract::{Path, Query, State};
use axum::Json;
use garde::Validate;

use super::error::ApiError;
use super::job_offers::require_offer;
use crate::app_state::AppState;
use crate::db::queries;
use crate::models::applicant::{
    CreateApplicantRequest, CreateApplicantsResponse, ListApplicantsQuery, ListApplicantsResponse,
};

/// POST /job_offers/{offer_id}/applicants: accepts a list of CVs.
pub async fn create_applicants(
    State(state): State<AppState>,
    Path(offer_id): Path<i32>,
    Json(request): Json<Vec<CreateApplicantRequest>>,
) -> Result<Json<CreateApplicantsResponse>, ApiError> {
    for applicant in &request {
        applicant.validate()?;
    }
    require_offer(&state, offer_id).await?;

    let cvs: Vec<&str> = request.iter().map(|a| a.cv.as_str()).collect();
    let applicants = queries::create_applicants(&state.db, offer_id, &cvs).await?;
    metrics::counter!("api_applicants_created_total").increment(applicants.len() as u64);
    tracing::info!(offer_id, count = applicants.len(), "Applicants created");

    Ok(Json(CreateApplicantsResponse {
        message: "Created successfully".to_string(),
        applicants,
    }))
}

/// GET /job_offers/{offer_id}/applicants
pub async fn list_applicants(
    State(state): State<AppState>,
    Path(offer_id): Path<i32>,
    Query(query): Query<ListApplicantsQuery>,
) -> Result<Json<ListApplicantsResponse>, ApiError> {
    query.validate()?;
    require_offer(&state, offer_id).await?;

    let applicants = queries::list_applicants(
        &state.db,
        offer_id,
        query.cv.as_deref(),
        query.limit,
        query.offset,
    )
    .await?;

    Ok(Json(ListApplicantsResponse { applicants }))
}
