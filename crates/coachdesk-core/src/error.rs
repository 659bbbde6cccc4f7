//! Error types shared by every Coachdesk crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoachdeskError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A concurrent or overlapping write lost; the caller may retry with
    /// different input.
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl CoachdeskError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type CoachdeskResult<T> = Result<T, CoachdeskError>;
