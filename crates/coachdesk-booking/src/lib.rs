//! Coachdesk Booking: invite tokens, availability, booking, attendance,
//! reviews and account registration.
//!
//! Every service is generic over the repository traits of
//! `coachdesk-core`, so this crate has no dependency on the database crate.

pub mod accounts;
pub mod attendance;
pub mod availability;
pub mod backfill;
pub mod clock;
pub mod config;
pub mod error;
pub mod invites;
pub mod locks;
pub mod reviews;
pub mod scheduler;
pub mod token;
pub mod validation;

pub use accounts::AccountService;
pub use attendance::AttendanceTracker;
pub use availability::AvailabilityStore;
pub use backfill::{BackfillReport, HistoryBackfill};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulingConfig;
pub use error::{BookingError, BookingResult};
pub use invites::{InviteRegistry, IssuedInvite};
pub use locks::{ScheduleGuard, ScheduleLocks};
pub use reviews::ReviewLedger;
pub use scheduler::BookingScheduler;
