//! Review domain model (append-only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub coach_id: Uuid,
    pub learner_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    pub booking_id: Uuid,
    pub coach_id: Uuid,
    pub learner_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

/// What a learner submits: a 1-5 rating and an optional comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewDraft {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i64,
    #[validate(length(max = 2000, message = "comment is longer than 2000 characters"))]
    pub comment: Option<String>,
}

/// Average rating of a coach over all reviews written for them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub coach_id: Uuid,
    /// Rounded to two decimals; `0.0` when there are no reviews.
    pub average: f64,
    pub count: u64,
}

impl RatingSummary {
    pub fn from_ratings(coach_id: Uuid, ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self {
                coach_id,
                average: 0.0,
                count: 0,
            };
        }
        let sum: u64 = ratings.iter().map(|r| u64::from(*r)).sum();
        let average = sum as f64 / ratings.len() as f64;
        Self {
            coach_id,
            average: (average * 100.0).round() / 100.0,
            count: ratings.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ratings_average_zero() {
        let id = Uuid::new_v4();
        let summary = RatingSummary::from_ratings(id, &[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let summary = RatingSummary::from_ratings(Uuid::new_v4(), &[5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.33);
    }
}
