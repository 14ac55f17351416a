use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{applicant::Applicant, criterion::Criterion};

/// Score of one applicant against one criterion, in [0, 1].
///
/// The row's existence is what marks the pair as evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantScore {
    pub criteria_id: i32,
    pub applicant_id: i32,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// An (applicant, criterion) pair of the same offer awaiting evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationPair {
    pub applicant: Applicant,
    pub criterion: Criterion,
}

impl EvaluationPair {
    /// Advisory lock key for this pair.
    pub fn lock_key(&self) -> i64 {
        pair_lock_key(self.applicant.id, self.criterion.id)
    }
}

impl fmt::Display for EvaluationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(a:{}, c:{})", self.applicant.id, self.criterion.id)
    }
}

/// Packs both ids into one 64-bit key: applicant in the high half, criterion in the low half.
/// Distinct pairs never share a key.
pub fn pair_lock_key(applicant_id: i32, criterion_id: i32) -> i64 {
    ((applicant_id as i64) << 32) | (criterion_id as u32 as i64)
}

#[derive(Debug, Serialize)]
pub struct GetScoresResponse {
    pub scores: Vec<ApplicantScore>,
}

#[derive(Debug, Serialize)]
pub struct GetScoreResponse {
    pub score: ApplicantScore,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScoreRequest {
    #[garde(range(min = 0.0, max = 1.0))]
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_is_injective_on_swapped_ids() {
        assert_ne!(pair_lock_key(1, 2), pair_lock_key(2, 1));
        assert_eq!(pair_lock_key(1, 2), (1i64 << 32) | 2);
    }

    #[test]
    fn test_lock_key_keeps_low_half_unsigned() {
        // A negative criterion id must not bleed into the applicant half
        assert_eq!(pair_lock_key(0, -1) >> 32, 0);
        assert_ne!(pair_lock_key(0, -1), pair_lock_key(-1, -1));
    }

    #[test]
    fn test_update_score_range() {
        assert!(UpdateScoreRequest { score: 0.9 }.validate().is_ok());
        assert!(UpdateScoreRequest { score: 8.5 }.validate().is_err());
    }
}
