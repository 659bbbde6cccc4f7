//! Booking error types.

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::booking::BookingStatus;
use coachdesk_core::schedule::TimeRange;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invite token is unknown, already used or expired")]
    InvalidToken,

    #[error("invalid time range: {0}")]
    InvalidRange(String),

    #[error("booking must start in the future")]
    PastTime,

    #[error("requested time is not inside the coach's availability")]
    SlotUnavailable,

    #[error("coach already has a booking in that time")]
    Overlap,

    #[error("learner already has a booking in that time")]
    LearnerOverlap,

    #[error("slot overlaps an existing availability slot")]
    SlotOverlap,

    #[error("slot still has live bookings")]
    SlotInUse,

    #[error("booking can no longer be cancelled")]
    TooLateToCancel,

    #[error("session has not ended yet")]
    SessionNotOver,

    #[error("booking cannot move from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("only attended bookings can be reviewed")]
    NotAttended,

    #[error("booking has already been reviewed")]
    AlreadyReviewed,

    #[error("rating {0} is out of range")]
    InvalidRating(i64),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] CoachdeskError),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Build a `[start, end)` range, rejecting empty or reversed input.
pub(crate) fn checked_range(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingResult<TimeRange> {
    TimeRange::new(start, end).map_err(|_| {
        BookingError::InvalidRange(format!("{start} is not before {end}"))
    })
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BookingError::Validation(errors.to_string())
    }
}

impl From<BookingError> for CoachdeskError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidRange(_)
            | BookingError::PastTime
            | BookingError::InvalidRating(_)
            | BookingError::Validation(_) => CoachdeskError::Validation {
                message: err.to_string(),
            },
            BookingError::InvalidToken
            | BookingError::SlotUnavailable
            | BookingError::Overlap
            | BookingError::LearnerOverlap
            | BookingError::SlotOverlap
            | BookingError::SlotInUse => CoachdeskError::Conflict {
                reason: err.to_string(),
            },
            BookingError::AlreadyReviewed => CoachdeskError::AlreadyExists {
                entity: "review".into(),
            },
            BookingError::TooLateToCancel
            | BookingError::SessionNotOver
            | BookingError::InvalidTransition { .. }
            | BookingError::NotAttended => CoachdeskError::InvalidState {
                reason: err.to_string(),
            },
            BookingError::Store(inner) => inner,
        }
    }
}
