use chrono::Utc;

use super::{ClaimSource, CriteriaSink, DispatchError, Pipeline, Staged, Storage};
use crate::models::job_offer::JobOffer;
use crate::services::remote::RemoteApiClient;

/// Turns pending job offers into criteria.
///
/// Offers are claimed with row locks (`FOR UPDATE SKIP LOCKED`), so the whole batch comes
/// back from a single candidate query.
pub struct Extractor<S> {
    storage: S,
    client: RemoteApiClient,
}

impl<S> Extractor<S> {
    pub fn new(storage: S, client: RemoteApiClient) -> Self {
        Self { storage, client }
    }
}

impl<S> Pipeline for Extractor<S>
where
    S: Storage,
    S::Batch: ClaimSource<JobOffer> + CriteriaSink,
{
    type Item = JobOffer;
    type Batch = S::Batch;

    const NAME: &'static str = "extractor";

    async fn begin(&self) -> Result<Self::Batch, sqlx::Error> {
        self.storage.begin().await
    }

    fn claim_window(&self, batch_size: usize) -> usize {
        batch_size
    }

    async fn dispatch_one(
        &self,
        batch: &Self::Batch,
        offer: &JobOffer,
    ) -> Result<Staged, DispatchError> {
        let criteria = self.client.extract_criteria(&offer.text).await?;
        tracing::info!(
            offer_id = offer.id,
            criteria = criteria.len(),
            "Successfully extracted criteria"
        );

        let staged = batch.stage_criteria(offer, &criteria).await?;
        if staged == Staged::Inserted {
            for criterion in &criteria {
                metrics::counter!("extractor_criteria_computed_total").increment(1);
                metrics::histogram!("extractor_criteria_importance_value")
                    .record(criterion.importance);
                metrics::histogram!("extractor_criteria_description_length")
                    .record(criterion.description.chars().count() as f64);
            }
            let age = Utc::now() - offer.created_at;
            metrics::histogram!("worker_time_since_schedule_seconds", "pipeline" => Self::NAME)
                .record(age.num_milliseconds() as f64 / 1000.0);
        }
        Ok(staged)
    }
}
