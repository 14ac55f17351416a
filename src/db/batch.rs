use sqlx::{Acquire, PgPool, Postgres, Row, Transaction};
use tokio::sync::Mutex;

use super::queries::{criterion_from_row, job_offer_from_row};
use crate::models::{
    applicant::Applicant,
    criterion::NewCriterion,
    job_offer::{JobOffer, JobOfferStatus},
    score::EvaluationPair,
};
use crate::pipeline::{Batch, ClaimSource, CriteriaSink, ScoreSink, Staged, Storage};

/// PostgreSQL-backed storage for both pipelines.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Storage for PgStorage {
    type Batch = PgBatch;

    async fn begin(&self) -> Result<PgBatch, sqlx::Error> {
        Ok(PgBatch {
            tx: Mutex::new(self.pool.begin().await?),
        })
    }
}

/// One cycle's transaction.
///
/// Concurrent dispatches share it through the mutex; a connection runs one statement at a
/// time. Each item's writes go through their own savepoint so a failed item leaves the
/// transaction usable for the rest of the batch.
pub struct PgBatch {
    tx: Mutex<Transaction<'static, Postgres>>,
}

impl Batch for PgBatch {
    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.into_inner().commit().await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.into_inner().rollback().await
    }
}

impl ClaimSource<JobOffer> for PgBatch {
    async fn candidates(&self, offset: i64, limit: i64) -> Result<Vec<JobOffer>, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query(
            r#"
            SELECT id, text, status, created_at
            FROM job_offers
            WHERE status = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(JobOfferStatus::Pending.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **tx)
        .await?;

        rows.iter().map(job_offer_from_row).collect()
    }

    async fn try_claim(&self, _offer: &JobOffer) -> Result<bool, sqlx::Error> {
        // Row lock already taken by the candidate query
        Ok(true)
    }
}

impl CriteriaSink for PgBatch {
    async fn stage_criteria(
        &self,
        offer: &JobOffer,
        criteria: &[NewCriterion],
    ) -> Result<Staged, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let mut savepoint = (&mut *tx).begin().await?;

        let updated = sqlx::query("UPDATE job_offers SET status = $1 WHERE id = $2 AND status = $3")
            .bind(JobOfferStatus::Done.to_string())
            .bind(offer.id)
            .bind(JobOfferStatus::Pending.to_string())
            .execute(&mut *savepoint)
            .await?;

        if updated.rows_affected() == 0 {
            savepoint.rollback().await?;
            return Ok(Staged::Discarded);
        }

        for criterion in criteria {
            sqlx::query("INSERT INTO criteria (offer_id, description, importance) VALUES ($1, $2, $3)")
                .bind(offer.id)
                .bind(&criterion.description)
                .bind(criterion.importance)
                .execute(&mut *savepoint)
                .await?;
        }

        savepoint.commit().await?;
        Ok(Staged::Inserted)
    }
}

impl ClaimSource<EvaluationPair> for PgBatch {
    async fn candidates(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<EvaluationPair>, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query(
            r#"
            SELECT a.id AS applicant_id, a.offer_id, a.cv, a.created_at AS applicant_created_at,
                   c.id, c.description, c.importance, c.created_at
            FROM applicants a
            JOIN criteria c ON c.offer_id = a.offer_id
            WHERE NOT EXISTS (
                SELECT 1 FROM applicant_scores s
                WHERE s.applicant_id = a.id AND s.criteria_id = c.id
            )
            ORDER BY a.created_at ASC, a.id ASC, c.id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **tx)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(EvaluationPair {
                    applicant: Applicant {
                        id: row.try_get("applicant_id")?,
                        offer_id: row.try_get("offer_id")?,
                        cv: row.try_get("cv")?,
                        created_at: row.try_get("applicant_created_at")?,
                    },
                    criterion: criterion_from_row(row)?,
                })
            })
            .collect()
    }

    async fn try_claim(&self, pair: &EvaluationPair) -> Result<bool, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_xact_lock($1)")
            .bind(pair.lock_key())
            .fetch_one(&mut **tx)
            .await?;
        Ok(acquired)
    }
}

impl ScoreSink for PgBatch {
    async fn stage_score(&self, pair: &EvaluationPair, score: f64) -> Result<Staged, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let mut savepoint = (&mut *tx).begin().await?;

        // Skips pairs another worker already scored, and pairs whose criterion was deleted
        // or re-described since selection. FOR SHARE holds off a concurrent edit until
        // commit, so its score invalidation sees this row.
        let inserted = sqlx::query(
            r#"
            INSERT INTO applicant_scores (applicant_id, criteria_id, score)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM applicants WHERE id = $1)
              AND EXISTS (
                  SELECT 1 FROM criteria
                  WHERE id = $2 AND description = $4
                  FOR SHARE
              )
            ON CONFLICT (applicant_id, criteria_id) DO NOTHING
            "#,
        )
        .bind(pair.applicant.id)
        .bind(pair.criterion.id)
        .bind(score)
        .bind(&pair.criterion.description)
        .execute(&mut *savepoint)
        .await?;

        savepoint.commit().await?;

        Ok(if inserted.rows_affected() == 0 {
            Staged::Discarded
        } else {
            Staged::Inserted
        })
    }
}
