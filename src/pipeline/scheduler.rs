use std::time::Instant;
use tokio::time::sleep;

use super::claim::claim_batch;
use super::dispatch::{dispatch_all, DispatchReport};
use super::{Batch, Pipeline};
use crate::config::WorkerConfig;

/// Result of one Running pass of the scheduler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub claimed: usize,
    pub dispatch: DispatchReport,
}

/// Claim, dispatch and commit one batch.
///
/// Storage errors while opening, claiming or committing are returned as-is; per-item
/// dispatch failures are absorbed into the report.
pub async fn run_cycle<P: Pipeline>(
    pipeline: &P,
    batch_size: usize,
) -> Result<CycleReport, sqlx::Error> {
    let batch = pipeline.begin().await?;

    let obtaining = Instant::now();
    let items: Vec<P::Item> =
        claim_batch(&batch, batch_size, pipeline.claim_window(batch_size)).await?;
    metrics::histogram!("worker_batch_obtaining_duration_seconds", "pipeline" => P::NAME)
        .record(obtaining.elapsed().as_secs_f64());

    if items.is_empty() {
        batch.rollback().await?;
        return Ok(CycleReport::default());
    }

    metrics::histogram!("worker_batch_size", "pipeline" => P::NAME).record(items.len() as f64);
    tracing::info!(
        pipeline = P::NAME,
        batch_size = items.len(),
        items = %items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        "Dispatching batch"
    );

    let dispatch = dispatch_all(P::NAME, &items, |item| pipeline.dispatch_one(&batch, item)).await;

    batch.commit().await?;

    Ok(CycleReport {
        claimed: items.len(),
        dispatch,
    })
}

/// Poll forever: run a cycle, then sleep the configured interval, even after an empty cycle.
///
/// Only returns on a storage failure, which the worker binaries treat as fatal.
pub async fn run<P: Pipeline>(pipeline: &P, config: &WorkerConfig) -> Result<(), sqlx::Error> {
    tracing::info!(
        pipeline = P::NAME,
        batch_size = config.batch_size,
        interval_seconds = config.interval_seconds,
        "Starting worker loop"
    );

    loop {
        let report = run_cycle(pipeline, config.batch_size).await?;
        if report.claimed > 0 {
            tracing::info!(
                pipeline = P::NAME,
                claimed = report.claimed,
                succeeded = report.dispatch.succeeded,
                discarded = report.dispatch.discarded,
                failed = report.dispatch.failed,
                "Batch committed"
            );
        } else {
            tracing::debug!(pipeline = P::NAME, "No pending work");
        }

        sleep(config.interval()).await;
    }
}
