use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A scoring criterion extracted from (or added to) a job offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub id: i32,
    pub offer_id: i32,
    pub description: String,
    /// Weight of the criterion, in [0, 1]
    pub importance: f64,
    pub created_at: DateTime<Utc>,
}

/// A criterion not yet persisted. Produced by the extractor and by `POST .../criteria`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct NewCriterion {
    #[garde(length(min = 1))]
    pub description: String,

    #[garde(range(min = 0.0, max = 1.0))]
    pub importance: f64,
}

#[derive(Debug, Serialize)]
pub struct GetCriteriaResponse {
    pub criteria: Vec<Criterion>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCriteriaRequest {
    #[garde(dive)]
    pub criteria: Vec<NewCriterion>,
}

#[derive(Debug, Serialize)]
pub struct AddCriteriaResponse {
    pub message: String,
    pub criteria: Vec<Criterion>,
}

/// Partial update. A changed description invalidates every score computed against it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCriterionRequest {
    #[garde(length(min = 1))]
    pub description: Option<String>,

    #[garde(range(min = 0.0, max = 1.0))]
    pub importance: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateCriterionResponse {
    pub message: String,
    pub criterion: Criterion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_out_of_range() {
        let criterion = NewCriterion {
            description: "Rust".to_string(),
            importance: 1.5,
        };
        assert!(criterion.validate().is_err());
    }

    #[test]
    fn test_add_request_validates_every_item() {
        let request = AddCriteriaRequest {
            criteria: vec![
                NewCriterion {
                    description: "Python".to_string(),
                    importance: 0.8,
                },
                NewCriterion {
                    description: String::new(),
                    importance: 0.2,
                },
            ],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_allows_absent_fields() {
        let request = UpdateCriterionRequest {
            description: None,
            importance: Some(0.3),
        };
        assert!(request.validate().is_ok());
    }
}
