//! Batch claiming and dispatch pipeline shared by the extractor and evaluator workers.
//!
//! A cycle opens one storage transaction, claims up to `batch_size` items through
//! [`claim::claim_batch`], fans out one remote call per item with [`dispatch::dispatch_all`],
//! and commits whatever the successful items staged. Claims are transaction-scoped, so a
//! failed item is simply picked up again by a later cycle.

pub mod claim;
pub mod dispatch;
pub mod evaluator;
pub mod extractor;
pub mod scheduler;

use std::fmt;

use crate::models::{criterion::NewCriterion, job_offer::JobOffer, score::EvaluationPair};
use crate::services::remote::RemoteError;

pub use claim::ClaimSource;

/// What happened to one item's result when it was written into the batch transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged {
    Inserted,
    /// Nothing was written: another worker already stored this result, or its source rows are gone.
    Discarded,
}

/// Opens the per-cycle transaction.
#[allow(async_fn_in_trait)]
pub trait Storage {
    type Batch: Batch;

    async fn begin(&self) -> Result<Self::Batch, sqlx::Error>;
}

/// The open transaction of one cycle. Claims are released on commit or rollback.
#[allow(async_fn_in_trait)]
pub trait Batch {
    async fn commit(self) -> Result<(), sqlx::Error>;

    async fn rollback(self) -> Result<(), sqlx::Error>;
}

/// Stages extracted criteria and marks the offer `DONE` atomically.
#[allow(async_fn_in_trait)]
pub trait CriteriaSink {
    async fn stage_criteria(
        &self,
        offer: &JobOffer,
        criteria: &[NewCriterion],
    ) -> Result<Staged, sqlx::Error>;
}

/// Stages one applicant score. A duplicate key is discarded, not an error.
#[allow(async_fn_in_trait)]
pub trait ScoreSink {
    async fn stage_score(&self, pair: &EvaluationPair, score: f64) -> Result<Staged, sqlx::Error>;
}

/// One of the two background pipelines, as driven by [`scheduler::run`].
#[allow(async_fn_in_trait)]
pub trait Pipeline {
    type Item: fmt::Display;
    type Batch: Batch + ClaimSource<Self::Item>;

    /// Label used in logs and metrics.
    const NAME: &'static str;

    async fn begin(&self) -> Result<Self::Batch, sqlx::Error>;

    /// Candidates fetched per round trip while claiming.
    fn claim_window(&self, batch_size: usize) -> usize;

    /// Call the remote service for one claimed item and stage its result.
    async fn dispatch_one(
        &self,
        batch: &Self::Batch,
        item: &Self::Item,
    ) -> Result<Staged, DispatchError>;
}

/// Failure of a single item. Contained by the dispatcher, never fatal to the cycle.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("remote call failed")]
    Remote(#[from] RemoteError),

    #[error("failed to stage result")]
    Storage(#[from] sqlx::Error),
}

impl DispatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Remote(e) if e.is_timeout())
    }
}
