use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extraction status of a job offer. Moves from `Pending` to `Done` once, never back.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobOfferStatus {
    Pending,
    Done,
}

/// A job offer whose text is mined for scoring criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: i32,
    pub text: String,
    pub status: JobOfferStatus,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for JobOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job offer {}", self.id)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobOfferRequest {
    #[garde(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CreateJobOfferResponse {
    pub message: String,
    pub job_offer: JobOffer,
}

/// Query string of `GET /job_offers`.
#[derive(Debug, Deserialize, Validate)]
pub struct ListJobOffersQuery {
    #[serde(default = "super::default_limit")]
    #[garde(range(min = 1, max = 1000))]
    pub limit: i64,

    #[serde(default)]
    #[garde(range(min = 0))]
    pub offset: i64,

    #[garde(skip)]
    pub text: Option<String>,

    #[garde(skip)]
    pub status: Option<JobOfferStatus>,
}

#[derive(Debug, Serialize)]
pub struct ListJobOffersResponse {
    pub job_offers: Vec<JobOffer>,
    pub cursor: i64,
}

#[derive(Debug, Serialize)]
pub struct GetJobOfferResponse {
    pub job_offer: JobOffer,
}
