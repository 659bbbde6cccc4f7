//! Coach domain model.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::rules;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coach {
    pub id: Uuid,
    /// Honorific such as `Dr` or `Ms`.
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coach {
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) => format!("{title} {} {}", self.first_name, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "create_coach_phone"))]
pub struct CreateCoach {
    pub title: Option<String>,
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(
        email(message = "please enter a valid email address"),
        custom(function = "crate::models::rules::dotted_domain")
    )]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "phone must be 7-20 characters"))]
    pub phone: Option<String>,
}

/// Profile fields a coach may edit after registration. `None` leaves a
/// field as it is; an empty string clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "update_coach_phone"))]
pub struct UpdateCoach {
    #[validate(length(max = 2000, message = "about text is longer than 2000 characters"))]
    pub about: Option<String>,
    #[validate(length(max = 20, message = "phone must be 7-20 characters"))]
    pub phone: Option<String>,
}

fn create_coach_phone(input: &CreateCoach) -> Result<(), ValidationError> {
    input.phone.as_deref().map_or(Ok(()), rules::phone_chars)
}

fn update_coach_phone(input: &UpdateCoach) -> Result<(), ValidationError> {
    match input.phone.as_deref() {
        None | Some("") => Ok(()),
        Some(phone) if phone.chars().count() < 7 => Err(ValidationError::new("phone")
            .with_message(Cow::Borrowed("phone must be 7-20 characters"))),
        Some(phone) => rules::phone_chars(phone),
    }
}
