use chrono::Utc;

use super::{ClaimSource, DispatchError, Pipeline, ScoreSink, Staged, Storage};
use crate::models::score::EvaluationPair;
use crate::services::remote::RemoteApiClient;

/// Scores each unevaluated (applicant, criterion) pair of the same offer.
///
/// A pair is not a physical row, so claims go through transaction-scoped advisory locks
/// taken one candidate at a time (or `claim_window` at a time when configured wider).
pub struct Evaluator<S> {
    storage: S,
    client: RemoteApiClient,
    claim_window: usize,
}

impl<S> Evaluator<S> {
    pub fn new(storage: S, client: RemoteApiClient, claim_window: usize) -> Self {
        Self {
            storage,
            client,
            claim_window,
        }
    }
}

impl<S> Pipeline for Evaluator<S>
where
    S: Storage,
    S::Batch: ClaimSource<EvaluationPair> + ScoreSink,
{
    type Item = EvaluationPair;
    type Batch = S::Batch;

    const NAME: &'static str = "evaluator";

    async fn begin(&self) -> Result<Self::Batch, sqlx::Error> {
        self.storage.begin().await
    }

    fn claim_window(&self, _batch_size: usize) -> usize {
        self.claim_window
    }

    async fn dispatch_one(
        &self,
        batch: &Self::Batch,
        pair: &EvaluationPair,
    ) -> Result<Staged, DispatchError> {
        let score = self
            .client
            .evaluate_applicant(&pair.criterion.description, &pair.applicant.cv)
            .await?;
        tracing::info!(
            applicant_id = pair.applicant.id,
            criterion_id = pair.criterion.id,
            score,
            "Successfully evaluated applicant"
        );

        let staged = batch.stage_score(pair, score).await?;
        if staged == Staged::Inserted {
            metrics::counter!("evaluator_scores_computed_total").increment(1);
            metrics::histogram!("evaluator_score_value").record(score);
            // the pair became schedulable when its later half was created
            let scheduled_at = pair.applicant.created_at.max(pair.criterion.created_at);
            let age = Utc::now() - scheduled_at;
            metrics::histogram!("worker_time_since_schedule_seconds", "pipeline" => Self::NAME)
                .record(age.num_milliseconds() as f64 / 1000.0);
        }
        Ok(staged)
    }
}
