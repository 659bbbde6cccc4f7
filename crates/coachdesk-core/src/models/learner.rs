//! Learner domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub age: u8,
    pub emergency_contact: String,
    /// Grade the learner has reached (0 = beginner, 5 = top).
    pub current_grade: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLearner {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(
        email(message = "please enter a valid email address"),
        custom(function = "crate::models::rules::dotted_domain")
    )]
    pub email: String,
    #[validate(custom(function = "crate::models::rules::known_gender"))]
    pub gender: String,
    #[validate(range(min = 4, max = 11, message = "age must be between 4 and 11"))]
    pub age: u8,
    #[validate(
        length(min = 7, max = 15, message = "emergency contact must be 7-15 characters"),
        custom(function = "crate::models::rules::phone_chars")
    )]
    pub emergency_contact: String,
    #[validate(range(max = 5, message = "current grade must be between 0 and 5"))]
    pub current_grade: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateLearner {
    #[validate(
        length(min = 7, max = 15, message = "emergency contact must be 7-15 characters"),
        custom(function = "crate::models::rules::phone_chars")
    )]
    pub emergency_contact: Option<String>,
    #[validate(range(max = 5, message = "current grade must be between 0 and 5"))]
    pub current_grade: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mia() -> CreateLearner {
        CreateLearner {
            first_name: "Mia".into(),
            last_name: "Chen".into(),
            email: "mia@example.com".into(),
            gender: "Female".into(),
            age: 8,
            emergency_contact: "555 123-4567".into(),
            current_grade: 2,
        }
    }

    #[test]
    fn well_formed_learner_passes() {
        assert!(mia().validate().is_ok());
    }

    #[test]
    fn each_rule_is_enforced() {
        let cases: [fn(&mut CreateLearner); 8] = [
            |l| l.first_name.clear(),
            |l| l.email = "mia@example".into(),
            |l| l.email = "mia example.com".into(),
            |l| l.gender = "female".into(),
            |l| l.age = 12,
            |l| l.age = 3,
            |l| l.emergency_contact = "555-CALL-NOW".into(),
            |l| l.current_grade = 6,
        ];
        for (i, break_it) in cases.iter().enumerate() {
            let mut learner = mia();
            break_it(&mut learner);
            assert!(learner.validate().is_err(), "case {i}");
        }
    }

    #[test]
    fn grade_update_is_bounded() {
        let ok = UpdateLearner {
            current_grade: Some(5),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
        let too_high = UpdateLearner {
            current_grade: Some(6),
            ..Default::default()
        };
        assert!(too_high.validate().is_err());
    }
}
