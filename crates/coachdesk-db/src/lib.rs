//! Coachdesk Database: SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization ([`apply_schema`])
//! - Error types ([`DbError`])
//! - Implementations of the `coachdesk-core` repository traits
//!   ([`repository`])

mod connection;
mod error;
mod guarded;
mod rows;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{apply_schema, schema_ddl};
