//! SurrealDB implementation of [`AvailabilityRepository`].

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskResult;
use coachdesk_core::models::availability::{AvailabilitySlot, CreateAvailabilitySlot};
use coachdesk_core::repository::AvailabilityRepository;
use coachdesk_core::schedule::TimeRange;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::guarded::retry_on_contention;
use crate::rows::parse_uuid;

#[derive(Debug, SurrealValue)]
struct SlotRow {
    coach_id: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SlotRowWithId {
    record_id: String,
    coach_id: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SlotRow {
    fn into_slot(self, id: Uuid) -> Result<AvailabilitySlot, DbError> {
        Ok(AvailabilitySlot {
            id,
            coach_id: parse_uuid(&self.coach_id, "coach")?,
            start: self.start_at,
            end: self.end_at,
            created_at: self.created_at,
        })
    }
}

impl SlotRowWithId {
    fn try_into_slot(self) -> Result<AvailabilitySlot, DbError> {
        let id = parse_uuid(&self.record_id, "availability slot")?;
        SlotRow {
            coach_id: self.coach_id,
            start_at: self.start_at,
            end_at: self.end_at,
            created_at: self.created_at,
        }
        .into_slot(id)
    }
}

/// SurrealDB implementation of the availability repository.
#[derive(Clone)]
pub struct SurrealAvailabilityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAvailabilityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Overlap check and insert commit together or not at all.
    async fn insert_guarded(&self, id: Uuid, input: &CreateAvailabilitySlot) -> Result<(), DbError> {
        let mut response = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 UPSERT type::record('schedule_rev', $coach_id) SET rev += 1; \
                 LET $clash = (SELECT VALUE id FROM availability_slot \
                     WHERE coach_id = $coach_id \
                     AND start_at < $end AND end_at > $start); \
                 IF array::len($clash) > 0 { THROW 'coachdesk:overlap'; }; \
                 CREATE type::record('availability_slot', $id) SET \
                     coach_id = $coach_id, start_at = $start, end_at = $end; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("coach_id", input.coach_id.to_string()))
            .bind(("start", input.range.start()))
            .bind(("end", input.range.end()))
            .await
            .map_err(DbError::from_statement)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(DbError::from_transaction(errors));
        }
        Ok(())
    }
}

impl<C: Connection> AvailabilityRepository for SurrealAvailabilityRepository<C> {
    async fn create(&self, input: CreateAvailabilitySlot) -> CoachdeskResult<AvailabilitySlot> {
        let id = Uuid::new_v4();
        let input = &input;
        retry_on_contention("availability_slot", || self.insert_guarded(id, input)).await?;
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CoachdeskResult<AvailabilitySlot> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('availability_slot', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SlotRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("availability_slot", &id_str))?;

        Ok(row.into_slot(id)?)
    }

    async fn delete(&self, id: Uuid) -> CoachdeskResult<()> {
        self.db
            .query("DELETE type::record('availability_slot', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_overlapping(
        &self,
        coach_id: Uuid,
        range: TimeRange,
    ) -> CoachdeskResult<Vec<AvailabilitySlot>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM availability_slot \
                 WHERE coach_id = $coach_id \
                 AND start_at < $end AND end_at > $start \
                 ORDER BY start_at ASC",
            )
            .bind(("coach_id", coach_id.to_string()))
            .bind(("start", range.start()))
            .bind(("end", range.end()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SlotRowWithId> = result.take(0).map_err(DbError::from)?;
        let slots = rows
            .into_iter()
            .map(|row| row.try_into_slot())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(slots)
    }
}
