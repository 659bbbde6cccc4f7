//! SurrealDB repository implementations.

mod availability;
mod booking;
mod coach;
mod invite;
mod learner;
mod review;

pub use availability::SurrealAvailabilityRepository;
pub use booking::SurrealBookingRepository;
pub use coach::SurrealCoachRepository;
pub use invite::SurrealInviteTokenRepository;
pub use learner::SurrealLearnerRepository;
pub use review::SurrealReviewRepository;
