//! Coachdesk Core: domain models, repository traits and time-range
//! arithmetic shared by the persistence and booking crates.

pub mod error;
pub mod models;
pub mod repository;
pub mod schedule;
