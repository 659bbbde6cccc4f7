//! Booking creation and cancellation.
//!
//! The check-then-insert sequence of [`BookingScheduler::book`] runs under
//! the coach's and the learner's locks from [`ScheduleLocks`]. The
//! repository insert re-checks for overlap inside a storage transaction that
//! also bumps a per-participant revision record, so a second process writing
//! to the same database loses with a conflict instead of double-booking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::booking::{Booking, BookingStatus, CreateBooking};
use coachdesk_core::repository::{
    AvailabilityRepository, BookingRepository, PaginatedResult, Pagination,
};
use coachdesk_core::schedule::TimeRange;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulingConfig;
use crate::error::{BookingError, BookingResult, checked_range};
use crate::locks::ScheduleLocks;

pub struct BookingScheduler<A: AvailabilityRepository, B: BookingRepository> {
    slots: A,
    bookings: B,
    locks: ScheduleLocks,
    config: SchedulingConfig,
    clock: Arc<dyn Clock>,
}

impl<A: AvailabilityRepository, B: BookingRepository> BookingScheduler<A, B> {
    pub fn new(slots: A, bookings: B, locks: ScheduleLocks, config: SchedulingConfig) -> Self {
        Self {
            slots,
            bookings,
            locks,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reserve `[start, end)` with `coach_id` for `learner_id`.
    pub async fn book(
        &self,
        learner_id: Uuid,
        coach_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        if start <= self.clock.now() {
            return Err(BookingError::PastTime);
        }
        let range = checked_range(start, end)?;

        // The learner's lock keeps two coaches from booking the same learner
        // into one hour.
        let _guard = self.locks.acquire_all(&[coach_id, learner_id]).await;

        let slots = self.slots.list_overlapping(coach_id, range).await?;
        if !slots.iter().any(|slot| slot.range().contains(&range)) {
            return Err(BookingError::SlotUnavailable);
        }
        if !self.bookings.live_for_coach(coach_id, range).await?.is_empty() {
            return Err(BookingError::Overlap);
        }
        if !self.bookings.live_for_learner(learner_id, range).await?.is_empty() {
            return Err(BookingError::LearnerOverlap);
        }

        let created = self
            .bookings
            .create(CreateBooking {
                learner_id,
                coach_id,
                range,
                status: BookingStatus::Scheduled,
            })
            .await;

        match created {
            Ok(booking) => {
                info!(
                    booking_id = %booking.id,
                    %learner_id,
                    %coach_id,
                    start = %booking.start,
                    end = %booking.end,
                    "booking created"
                );
                Ok(booking)
            }
            Err(CoachdeskError::Conflict { .. }) => {
                warn!(%coach_id, %learner_id, "booking lost a storage-level overlap race");
                Err(self.classify_overlap(learner_id, coach_id, range).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cancel a `Scheduled` booking that has not started yet (at least
    /// `cancellation_notice` ahead of its start).
    pub async fn cancel(&self, booking_id: Uuid) -> BookingResult<Booking> {
        let booking = self.bookings.get_by_id(booking_id).await?;
        if booking.status.is_terminal() {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Cancelled,
            });
        }
        if booking.start - self.config.cancellation_notice() <= self.clock.now() {
            return Err(BookingError::TooLateToCancel);
        }

        let cancelled = transition(
            &self.bookings,
            booking_id,
            BookingStatus::Scheduled,
            BookingStatus::Cancelled,
        )
        .await?;
        info!(%booking_id, coach_id = %cancelled.coach_id, "booking cancelled");
        Ok(cancelled)
    }

    pub async fn get(&self, booking_id: Uuid) -> BookingResult<Booking> {
        Ok(self.bookings.get_by_id(booking_id).await?)
    }

    /// Scheduled bookings of a learner that have not ended, soonest first.
    pub async fn upcoming_for_learner(&self, learner_id: Uuid) -> BookingResult<Vec<Booking>> {
        Ok(self
            .bookings
            .scheduled_for_learner(learner_id, self.clock.now())
            .await?)
    }

    /// Every booking of a learner, most recent first.
    pub async fn history_for_learner(
        &self,
        learner_id: Uuid,
        pagination: Pagination,
    ) -> BookingResult<PaginatedResult<Booking>> {
        Ok(self.bookings.list_for_learner(learner_id, pagination).await?)
    }

    /// Live bookings of a coach within `[start, end)`.
    pub async fn schedule_for_coach(
        &self,
        coach_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<Vec<Booking>> {
        let range = checked_range(start, end)?;
        Ok(self.bookings.live_for_coach(coach_id, range).await?)
    }

    async fn classify_overlap(&self, learner_id: Uuid, coach_id: Uuid, range: TimeRange) -> BookingError {
        let coach_busy = self.bookings.live_for_coach(coach_id, range).await;
        let learner_busy = self.bookings.live_for_learner(learner_id, range).await;
        match (coach_busy, learner_busy) {
            (Ok(coach), Ok(learner)) if coach.is_empty() && !learner.is_empty() => {
                BookingError::LearnerOverlap
            }
            _ => BookingError::Overlap,
        }
    }
}

/// Conditional status change. A booking whose status moved on in the
/// meantime yields `InvalidTransition` from its current status.
pub(crate) async fn transition<B: BookingRepository>(
    bookings: &B,
    booking_id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
) -> BookingResult<Booking> {
    match bookings.transition(booking_id, from, to).await {
        Ok(booking) => Ok(booking),
        Err(CoachdeskError::Conflict { .. }) => {
            let current = bookings.get_by_id(booking_id).await?;
            Err(BookingError::InvalidTransition {
                from: current.status,
                to,
            })
        }
        Err(e) => Err(e.into()),
    }
}
