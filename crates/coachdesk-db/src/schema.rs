//! Schema definitions for SurrealDB.
//!
//! All tables use SCHEMAFULL mode. UUIDs are stored as strings, enums as
//! strings with ASSERT constraints, instants as datetimes. Every DEFINE is
//! `IF NOT EXISTS`, so applying the schema to a populated database is a
//! no-op.

use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

const SCHEMA: &str = "\
-- =======================================================================
-- Coaches
-- =======================================================================
DEFINE TABLE IF NOT EXISTS coach SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS title ON TABLE coach TYPE option<string>;
DEFINE FIELD IF NOT EXISTS first_name ON TABLE coach TYPE string;
DEFINE FIELD IF NOT EXISTS last_name ON TABLE coach TYPE string;
DEFINE FIELD IF NOT EXISTS email ON TABLE coach TYPE string;
DEFINE FIELD IF NOT EXISTS phone ON TABLE coach TYPE option<string>;
DEFINE FIELD IF NOT EXISTS about ON TABLE coach TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE coach TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE coach TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_coach_email ON TABLE coach \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Learners
-- =======================================================================
DEFINE TABLE IF NOT EXISTS learner SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS first_name ON TABLE learner TYPE string;
DEFINE FIELD IF NOT EXISTS last_name ON TABLE learner TYPE string;
DEFINE FIELD IF NOT EXISTS email ON TABLE learner TYPE string;
DEFINE FIELD IF NOT EXISTS gender ON TABLE learner TYPE string;
DEFINE FIELD IF NOT EXISTS age ON TABLE learner TYPE int;
DEFINE FIELD IF NOT EXISTS emergency_contact ON TABLE learner \
    TYPE string;
DEFINE FIELD IF NOT EXISTS current_grade ON TABLE learner TYPE int \
    ASSERT $value >= 0 AND $value <= 5;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE learner TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE learner TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_learner_email ON TABLE learner \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Invite tokens (single use, only the hash is stored)
-- =======================================================================
DEFINE TABLE IF NOT EXISTS invite_token SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS token_hash ON TABLE invite_token TYPE string;
DEFINE FIELD IF NOT EXISTS note ON TABLE invite_token TYPE option<string>;
DEFINE FIELD IF NOT EXISTS issued_at ON TABLE invite_token TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS expires_at ON TABLE invite_token TYPE datetime;
DEFINE FIELD IF NOT EXISTS consumed ON TABLE invite_token TYPE bool \
    DEFAULT false;
DEFINE FIELD IF NOT EXISTS consumed_at ON TABLE invite_token \
    TYPE option<datetime>;
DEFINE FIELD IF NOT EXISTS consumed_by ON TABLE invite_token \
    TYPE option<string>;
DEFINE INDEX IF NOT EXISTS idx_invite_token_hash ON TABLE invite_token \
    COLUMNS token_hash UNIQUE;

-- =======================================================================
-- Availability slots (per coach, non-overlapping)
-- =======================================================================
DEFINE TABLE IF NOT EXISTS availability_slot SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS coach_id ON TABLE availability_slot TYPE string;
DEFINE FIELD IF NOT EXISTS start_at ON TABLE availability_slot \
    TYPE datetime;
DEFINE FIELD IF NOT EXISTS end_at ON TABLE availability_slot \
    TYPE datetime;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE availability_slot \
    TYPE datetime DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_slot_coach_start ON TABLE availability_slot \
    COLUMNS coach_id, start_at;

-- =======================================================================
-- Schedule revisions, one row per coach or learner id. Every guarded
-- slot or booking write bumps the rows it touches, so concurrent writers
-- to one schedule conflict at commit.
-- =======================================================================
DEFINE TABLE IF NOT EXISTS schedule_rev SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS rev ON TABLE schedule_rev TYPE int DEFAULT 0;

-- =======================================================================
-- Bookings
-- =======================================================================
DEFINE TABLE IF NOT EXISTS booking SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS learner_id ON TABLE booking TYPE string;
DEFINE FIELD IF NOT EXISTS coach_id ON TABLE booking TYPE string;
DEFINE FIELD IF NOT EXISTS start_at ON TABLE booking TYPE datetime;
DEFINE FIELD IF NOT EXISTS end_at ON TABLE booking TYPE datetime;
DEFINE FIELD IF NOT EXISTS status ON TABLE booking TYPE string \
    ASSERT $value IN ['Scheduled', 'Attended', 'NoShow', 'Cancelled'];
DEFINE FIELD IF NOT EXISTS created_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_booking_coach_start ON TABLE booking \
    COLUMNS coach_id, start_at;
DEFINE INDEX IF NOT EXISTS idx_booking_learner_start ON TABLE booking \
    COLUMNS learner_id, start_at;
DEFINE INDEX IF NOT EXISTS idx_booking_status_end ON TABLE booking \
    COLUMNS status, end_at;

-- =======================================================================
-- Reviews (append-only, one per booking)
-- =======================================================================
DEFINE TABLE IF NOT EXISTS review SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD IF NOT EXISTS booking_id ON TABLE review TYPE string;
DEFINE FIELD IF NOT EXISTS coach_id ON TABLE review TYPE string;
DEFINE FIELD IF NOT EXISTS learner_id ON TABLE review TYPE string;
DEFINE FIELD IF NOT EXISTS rating ON TABLE review TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD IF NOT EXISTS comment ON TABLE review TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE review TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_review_booking ON TABLE review \
    COLUMNS booking_id UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_review_coach ON TABLE review \
    COLUMNS coach_id, created_at;
";

/// Define every Coachdesk table, field and index.
pub async fn apply_schema<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    info!("Applying Coachdesk schema");

    db.query(SCHEMA)
        .await?
        .check()
        .map_err(|e| DbError::Schema(e.to_string()))?;

    Ok(())
}

/// Returns the raw schema DDL.
pub fn schema_ddl() -> &'static str {
    SCHEMA
}
