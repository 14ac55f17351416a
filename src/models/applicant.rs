use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// An applicant to a job offer, identified by their CV text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    pub id: i32,
    pub offer_id: i32,
    pub cv: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicantRequest {
    #[garde(length(min = 1))]
    pub cv: String,
}

#[derive(Debug, Serialize)]
pub struct CreateApplicantsResponse {
    pub message: String,
    pub applicants: Vec<Applicant>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListApplicantsQuery {
    #[serde(default = "super::default_limit")]
    #[garde(range(min = 1, max = 1000))]
    pub limit: i64,

    #[serde(default)]
    #[garde(range(min = 0))]
    pub offset: i64,

    #[garde(skip)]
    pub cv: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListApplicantsResponse {
    pub applicants: Vec<Applicant>,
}
