use futures::future::join_all;
use std::error::Error;
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use super::{DispatchError, Staged};

/// Per-cycle tally of dispatch outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: usize,
    pub discarded: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.discarded + self.failed
    }
}

/// Run `handler` for every item concurrently and wait for all of them to settle.
///
/// Each item's error is logged with its full cause chain and counted; it never cancels
/// siblings and never escapes. A failed item stages nothing, so it stays eligible for a
/// later cycle.
pub async fn dispatch_all<'a, T, F, Fut>(
    pipeline: &'static str,
    items: &'a [T],
    handler: F,
) -> DispatchReport
where
    T: Display,
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<Staged, DispatchError>>,
{
    let started = Instant::now();
    let handler = &handler;

    let outcomes = join_all(items.iter().map(|item| async move {
        let start = Instant::now();
        let outcome = handler(item).await;
        metrics::histogram!("worker_single_dispatch_duration_seconds", "pipeline" => pipeline)
            .record(start.elapsed().as_secs_f64());
        (item, outcome)
    }))
    .await;

    let mut report = DispatchReport::default();
    for (item, outcome) in outcomes {
        metrics::counter!("worker_dispatches_total", "pipeline" => pipeline).increment(1);
        match outcome {
            Ok(Staged::Inserted) => report.succeeded += 1,
            Ok(Staged::Discarded) => {
                report.discarded += 1;
                tracing::warn!(pipeline, item = %item, "Result discarded, already stored or source rows gone");
            }
            Err(e) => {
                report.failed += 1;
                metrics::counter!("worker_failed_dispatches_total", "pipeline" => pipeline)
                    .increment(1);
                if e.is_timeout() {
                    metrics::counter!("worker_timeouts_total", "pipeline" => pipeline).increment(1);
                }
                tracing::error!(
                    pipeline,
                    item = %item,
                    error = %error_chain(&e),
                    "Dispatch failed"
                );
            }
        }
    }

    metrics::histogram!("worker_batch_dispatch_duration_seconds", "pipeline" => pipeline)
        .record(started.elapsed().as_secs_f64());

    report
}

/// Render an error and every `source()` below it, outermost first.
pub fn error_chain(err: &dyn Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
