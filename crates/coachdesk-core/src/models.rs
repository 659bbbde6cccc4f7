//! Domain models for Coachdesk.
//!
//! These are the core types shared across all crates.

pub mod availability;
pub mod booking;
pub mod coach;
pub mod invite;
pub mod learner;
pub mod review;
pub mod rules;
