//! Append-only reviews of attended sessions.

use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::booking::BookingStatus;
use coachdesk_core::models::review::{CreateReview, RatingSummary, Review, ReviewDraft};
use coachdesk_core::repository::{BookingRepository, PaginatedResult, Pagination, ReviewRepository};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::{BookingError, BookingResult};

pub struct ReviewLedger<B: BookingRepository, R: ReviewRepository> {
    bookings: B,
    reviews: R,
}

impl<B: BookingRepository, R: ReviewRepository> ReviewLedger<B, R> {
    pub fn new(bookings: B, reviews: R) -> Self {
        Self { bookings, reviews }
    }

    /// Review an attended booking. Each booking takes one review, ever.
    pub async fn add_review(
        &self,
        booking_id: Uuid,
        rating: i64,
        comment: Option<String>,
    ) -> BookingResult<Review> {
        let draft = ReviewDraft {
            rating,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };
        let checked = draft.validate();
        if ValidationErrors::has_error(&checked, "rating") {
            return Err(BookingError::InvalidRating(rating));
        }
        checked?;

        let booking = self.bookings.get_by_id(booking_id).await?;
        if booking.status != BookingStatus::Attended {
            return Err(BookingError::NotAttended);
        }

        let created = self
            .reviews
            .create(CreateReview {
                booking_id,
                coach_id: booking.coach_id,
                learner_id: booking.learner_id,
                rating: u8::try_from(rating).map_err(|_| BookingError::InvalidRating(rating))?,
                comment: draft.comment,
            })
            .await;

        match created {
            Ok(review) => {
                info!(review_id = %review.id, %booking_id, coach_id = %review.coach_id, "review added");
                Ok(review)
            }
            Err(CoachdeskError::AlreadyExists { .. }) => Err(BookingError::AlreadyReviewed),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn review_for_booking(&self, booking_id: Uuid) -> BookingResult<Review> {
        Ok(self.reviews.get_by_booking(booking_id).await?)
    }

    pub async fn reviews_for_coach(
        &self,
        coach_id: Uuid,
        pagination: Pagination,
    ) -> BookingResult<PaginatedResult<Review>> {
        Ok(self.reviews.list_for_coach(coach_id, pagination).await?)
    }

    pub async fn coach_rating(&self, coach_id: Uuid) -> BookingResult<RatingSummary> {
        let ratings = self.reviews.ratings_for_coach(coach_id).await?;
        Ok(RatingSummary::from_ratings(coach_id, &ratings))
    }
}
