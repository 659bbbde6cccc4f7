//! Attendance state machine: closing out sessions once they are over.

use std::sync::Arc;

use coachdesk_core::models::booking::{AttendanceSummary, Booking, BookingStatus};
use coachdesk_core::repository::BookingRepository;
use tracing::info;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulingConfig;
use crate::error::{BookingError, BookingResult};
use crate::scheduler::transition;

pub struct AttendanceTracker<B: BookingRepository> {
    bookings: B,
    config: SchedulingConfig,
    clock: Arc<dyn Clock>,
}

impl<B: BookingRepository> AttendanceTracker<B> {
    pub fn new(bookings: B, config: SchedulingConfig) -> Self {
        Self {
            bookings,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn mark_attended(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.close(booking_id, BookingStatus::Attended).await
    }

    pub async fn mark_no_show(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.close(booking_id, BookingStatus::NoShow).await
    }

    /// Mark every `Scheduled` booking that ended more than
    /// `attendance_grace` ago as a no-show. Running it again right away
    /// changes nothing.
    pub async fn sweep(&self) -> BookingResult<u64> {
        let cutoff = self.clock.now() - self.config.attendance_grace();
        let closed = self
            .bookings
            .close_scheduled_before(cutoff, BookingStatus::NoShow)
            .await?;
        if closed > 0 {
            info!(closed, %cutoff, "attendance sweep marked no-shows");
        }
        Ok(closed)
    }

    pub async fn summary(&self, learner_id: Uuid) -> BookingResult<AttendanceSummary> {
        Ok(self.bookings.attendance_summary(learner_id).await?)
    }

    async fn close(&self, booking_id: Uuid, to: BookingStatus) -> BookingResult<Booking> {
        let booking = self.bookings.get_by_id(booking_id).await?;
        if !booking.status.can_transition_to(to) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to,
            });
        }
        if booking.end > self.clock.now() {
            return Err(BookingError::SessionNotOver);
        }

        let closed = transition(&self.bookings, booking_id, BookingStatus::Scheduled, to).await?;
        info!(%booking_id, status = %closed.status, "attendance recorded");
        Ok(closed)
    }
}
