pub mod applicant;
pub mod criterion;
pub mod job_offer;
pub mod score;

fn default_limit() -> i64 {
    100
}
