use garde::Validate;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::config::RemoteApiConfig;
use crate::models::criterion::NewCriterion;

/// Client for the remote extraction and evaluation services.
///
/// Both services expose a single `POST {base_url}/eval` endpoint behind bearer auth.
pub struct RemoteApiClient {
    http: Client,
    eval_url: String,
    bearer_token: String,
}

#[derive(Serialize)]
struct ExtractionRequest<'a> {
    offer_text: &'a str,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CriteriaExtractionResponse {
    #[garde(dive)]
    pub criteria: Vec<NewCriterion>,
}

#[derive(Serialize)]
struct EvaluationRequest<'a> {
    criteria_description: &'a str,
    applicant_cv: &'a str,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplicantEvaluationResponse {
    #[garde(range(min = 0.0, max = 1.0))]
    pub score: f64,
}

impl RemoteApiClient {
    pub fn new(config: &RemoteApiConfig, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            eval_url: format!("{}/eval", config.base_url.trim_end_matches('/')),
            bearer_token: config.bearer_token.clone(),
        })
    }

    /// Ask the extraction service for the scoring criteria of a job offer.
    pub async fn extract_criteria(&self, offer_text: &str) -> Result<Vec<NewCriterion>, RemoteError> {
        let response: CriteriaExtractionResponse =
            self.post_eval(&ExtractionRequest { offer_text }).await?;
        Ok(response.criteria)
    }

    /// Ask the evaluation service to score a CV against one criterion.
    pub async fn evaluate_applicant(
        &self,
        criteria_description: &str,
        applicant_cv: &str,
    ) -> Result<f64, RemoteError> {
        let response: ApplicantEvaluationResponse = self
            .post_eval(&EvaluationRequest {
                criteria_description,
                applicant_cv,
            })
            .await?;
        Ok(response.score)
    }

    async fn post_eval<B, R>(&self, body: &B) -> Result<R, RemoteError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Validate<Context = ()>,
    {
        let response = self
            .http
            .post(&self.eval_url)
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: R = response.json().await?;
        parsed.validate()?;
        Ok(parsed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("response failed validation")]
    Invalid(#[from] garde::Report),
}

impl RemoteError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Http(e) if e.is_timeout())
    }
}
