//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Operations that must hold an
//! invariant under concurrency (token consumption, booking insertion,
//! status transitions) are specified as conditional writes so that the
//! storage layer, not the caller, decides the winner.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoachdeskResult;
use crate::models::{
    availability::{AvailabilitySlot, CreateAvailabilitySlot},
    booking::{AttendanceSummary, Booking, BookingStatus, CreateBooking},
    coach::{Coach, CreateCoach, UpdateCoach},
    invite::{CreateInviteToken, InviteToken},
    learner::{CreateLearner, Learner, UpdateLearner},
    review::{CreateReview, Review},
};
use crate::schedule::TimeRange;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait CoachRepository: Send + Sync {
    fn create(&self, input: CreateCoach) -> impl Future<Output = CoachdeskResult<Coach>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CoachdeskResult<Coach>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CoachdeskResult<Coach>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CoachdeskResult<PaginatedResult<Coach>>> + Send;
    /// Apply a profile edit. An empty string clears the field.
    fn update_profile(
        &self,
        id: Uuid,
        input: UpdateCoach,
    ) -> impl Future<Output = CoachdeskResult<Coach>> + Send;
}

pub trait LearnerRepository: Send + Sync {
    fn create(&self, input: CreateLearner)
    -> impl Future<Output = CoachdeskResult<Learner>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CoachdeskResult<Learner>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CoachdeskResult<Learner>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateLearner,
    ) -> impl Future<Output = CoachdeskResult<Learner>> + Send;
    /// Case-insensitive substring match on first name, last name or email,
    /// ordered by last name then first name. `query` is expected lowercased.
    fn search(
        &self,
        query: &str,
        limit: u64,
    ) -> impl Future<Output = CoachdeskResult<Vec<Learner>>> + Send;
}

// ---------------------------------------------------------------------------
// Invite tokens
// ---------------------------------------------------------------------------

pub trait InviteTokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateInviteToken,
    ) -> impl Future<Output = CoachdeskResult<InviteToken>> + Send;
    fn get_by_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = CoachdeskResult<InviteToken>> + Send;
    /// Atomically mark the token consumed if it is unconsumed and not
    /// expired at `now`. Returns `NotFound` when no token qualified.
    fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = CoachdeskResult<InviteToken>> + Send;
    /// Record which coach account the consumed token produced.
    fn attach_coach(
        &self,
        id: Uuid,
        coach_id: Uuid,
    ) -> impl Future<Output = CoachdeskResult<InviteToken>> + Send;
    /// Undo a consumption whose registration could not be completed.
    fn release(&self, id: Uuid) -> impl Future<Output = CoachdeskResult<()>> + Send;
    /// Remove expired tokens that were never consumed.
    fn cleanup_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = CoachdeskResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

pub trait AvailabilityRepository: Send + Sync {
    /// Insert a slot unless it overlaps another slot of the same coach,
    /// in which case `Conflict` is returned.
    fn create(
        &self,
        input: CreateAvailabilitySlot,
    ) -> impl Future<Output = CoachdeskResult<AvailabilitySlot>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CoachdeskResult<AvailabilitySlot>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CoachdeskResult<()>> + Send;
    /// Slots of `coach_id` overlapping `range`, ordered by start.
    fn list_overlapping(
        &self,
        coach_id: Uuid,
        range: TimeRange,
    ) -> impl Future<Output = CoachdeskResult<Vec<AvailabilitySlot>>> + Send;
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

pub trait BookingRepository: Send + Sync {
    /// Insert a booking unless a live booking of the same coach or the
    /// same learner overlaps it, in which case `Conflict` is returned.
    fn create(&self, input: CreateBooking)
    -> impl Future<Output = CoachdeskResult<Booking>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CoachdeskResult<Booking>> + Send;
    /// Live (non-cancelled) bookings of a coach overlapping `range`.
    fn live_for_coach(
        &self,
        coach_id: Uuid,
        range: TimeRange,
    ) -> impl Future<Output = CoachdeskResult<Vec<Booking>>> + Send;
    /// Live (non-cancelled) bookings of a learner overlapping `range`.
    fn live_for_learner(
        &self,
        learner_id: Uuid,
        range: TimeRange,
    ) -> impl Future<Output = CoachdeskResult<Vec<Booking>>> + Send;
    /// `Scheduled` bookings of a learner ending after `after`, soonest
    /// first.
    fn scheduled_for_learner(
        &self,
        learner_id: Uuid,
        after: DateTime<Utc>,
    ) -> impl Future<Output = CoachdeskResult<Vec<Booking>>> + Send;
    /// All bookings of a learner, most recent start first.
    fn list_for_learner(
        &self,
        learner_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CoachdeskResult<PaginatedResult<Booking>>> + Send;
    /// Move a booking from `from` to `to` only if its status is still
    /// `from`. Returns `Conflict` when the status had already changed.
    fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> impl Future<Output = CoachdeskResult<Booking>> + Send;
    /// Mark every `Scheduled` booking that ended before `cutoff` as
    /// `to`. Returns the number of bookings changed.
    fn close_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
        to: BookingStatus,
    ) -> impl Future<Output = CoachdeskResult<u64>> + Send;
    fn attendance_summary(
        &self,
        learner_id: Uuid,
    ) -> impl Future<Output = CoachdeskResult<AttendanceSummary>> + Send;
}

// ---------------------------------------------------------------------------
// Reviews (append-only)
// ---------------------------------------------------------------------------

pub trait ReviewRepository: Send + Sync {
    /// Append a review. A second review for the same booking yields
    /// `AlreadyExists`. No update or delete operations exist.
    fn create(&self, input: CreateReview) -> impl Future<Output = CoachdeskResult<Review>> + Send;
    fn get_by_booking(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = CoachdeskResult<Review>> + Send;
    fn list_for_coach(
        &self,
        coach_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CoachdeskResult<PaginatedResult<Review>>> + Send;
    /// Every rating written for a coach.
    fn ratings_for_coach(
        &self,
        coach_id: Uuid,
    ) -> impl Future<Output = CoachdeskResult<Vec<u8>>> + Send;
}
