//! Input normalization ahead of the `Validate` derives on the core models.
//!
//! Forms arrive with stray whitespace and mixed-case emails; the rules in
//! `coachdesk_core::models` run against the cleaned values.

use coachdesk_core::models::coach::{CreateCoach, UpdateCoach};
use coachdesk_core::models::learner::CreateLearner;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn trimmed_or_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn normalize_learner(input: CreateLearner) -> CreateLearner {
    CreateLearner {
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email: normalize_email(&input.email),
        gender: input.gender.trim().to_string(),
        emergency_contact: input.emergency_contact.trim().to_string(),
        ..input
    }
}

pub fn normalize_coach(input: CreateCoach) -> CreateCoach {
    CreateCoach {
        title: trimmed_or_none(input.title),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email: normalize_email(&input.email),
        phone: trimmed_or_none(input.phone),
    }
}

/// Trims both fields but keeps `Some("")`, which clears the stored value.
pub fn normalize_profile(input: UpdateCoach) -> UpdateCoach {
    UpdateCoach {
        about: input.about.map(|a| a.trim().to_string()),
        phone: input.phone.map(|p| p.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn blank_optionals_are_dropped_for_new_coaches() {
        let coach = normalize_coach(CreateCoach {
            title: Some("  ".into()),
            first_name: " Tom ".into(),
            last_name: "Baker".into(),
            email: " TOM@example.com".into(),
            phone: Some("   ".into()),
        });
        assert_eq!(coach.title, None);
        assert_eq!(coach.phone, None);
        assert_eq!(coach.first_name, "Tom");
        assert!(coach.validate().is_ok());
    }

    #[test]
    fn whitespace_only_name_fails_after_trimming() {
        let learner = normalize_learner(CreateLearner {
            first_name: "   ".into(),
            last_name: "Lee".into(),
            email: "mia@example.com".into(),
            gender: " Female ".into(),
            age: 8,
            emergency_contact: " 555 123 4567 ".into(),
            current_grade: 2,
        });
        assert_eq!(learner.gender, "Female");
        let errors = learner.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }

    #[test]
    fn profile_keeps_explicit_clears() {
        let profile = normalize_profile(UpdateCoach {
            about: Some("  Piano and theory. ".into()),
            phone: Some("  ".into()),
        });
        assert_eq!(profile.about.as_deref(), Some("Piano and theory."));
        assert_eq!(profile.phone.as_deref(), Some(""));
    }
}
