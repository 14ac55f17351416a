/// A storage transaction that can offer work candidates and claim them without blocking.
///
/// Implementations pick the locking primitive: row locks taken with `FOR UPDATE SKIP LOCKED`
/// (the candidate query already holds the claim) or transaction-scoped advisory locks
/// (`try_claim` acquires it). Either way a claim lives until the transaction ends.
#[allow(async_fn_in_trait)]
pub trait ClaimSource<T> {
    /// Up to `limit` candidates starting at `offset`, oldest first.
    async fn candidates(&self, offset: i64, limit: i64) -> Result<Vec<T>, sqlx::Error>;

    /// Attempt an exclusive claim. `false` means another worker holds it.
    async fn try_claim(&self, candidate: &T) -> Result<bool, sqlx::Error>;
}

/// Walk candidates in order and claim up to `batch_size` of them.
///
/// The offset advances by one per attempted candidate, claimed or skipped. Contended
/// candidates are skipped for this cycle rather than waited on. The walk stops once the
/// batch is full or a window comes back short.
pub async fn claim_batch<T, S>(
    source: &S,
    batch_size: usize,
    window: usize,
) -> Result<Vec<T>, sqlx::Error>
where
    S: ClaimSource<T>,
{
    let mut claimed = Vec::with_capacity(batch_size);
    let window = window.max(1);
    let mut offset: i64 = 0;

    while claimed.len() < batch_size {
        let limit = window.min(batch_size - claimed.len());
        let candidates = source.candidates(offset, limit as i64).await?;
        let fetched = candidates.len();

        for candidate in candidates {
            if source.try_claim(&candidate).await? {
                claimed.push(candidate);
            } else {
                tracing::trace!(offset, "Candidate held by another worker, skipping");
            }
        }

        offset += fetched as i64;
        if fetched < limit {
            break;
        }
    }

    Ok(claimed)
}
