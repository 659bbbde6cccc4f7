//! SurrealDB implementation of [`BookingRepository`].

use chrono::{DateTime, Utc};
use coachdesk_core::error::{CoachdeskError, CoachdeskResult};
use coachdesk_core::models::booking::{AttendanceSummary, Booking, BookingStatus, CreateBooking};
use coachdesk_core::repository::{BookingRepository, PaginatedResult, Pagination};
use coachdesk_core::schedule::TimeRange;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::guarded::retry_on_contention;
use crate::rows::{CountRow, parse_uuid};

#[derive(Debug, SurrealValue)]
struct BookingRow {
    learner_id: String,
    coach_id: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct BookingRowWithId {
    record_id: String,
    learner_id: String,
    coach_id: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct StatusCountRow {
    status: String,
    total: u64,
}

fn parse_status(raw: &str) -> Result<BookingStatus, DbError> {
    BookingStatus::parse(raw).ok_or_else(|| DbError::Corrupt(format!("unknown booking status: {raw}")))
}

impl BookingRow {
    fn into_booking(self, id: Uuid) -> Result<Booking, DbError> {
        Ok(Booking {
            id,
            learner_id: parse_uuid(&self.learner_id, "learner")?,
            coach_id: parse_uuid(&self.coach_id, "coach")?,
            start: self.start_at,
            end: self.end_at,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BookingRowWithId {
    fn try_into_booking(self) -> Result<Booking, DbError> {
        let id = parse_uuid(&self.record_id, "booking")?;
        BookingRow {
            learner_id: self.learner_id,
            coach_id: self.coach_id,
            start_at: self.start_at,
            end_at: self.end_at,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_booking(id)
    }
}

fn collect(rows: Vec<BookingRowWithId>) -> Result<Vec<Booking>, DbError> {
    rows.into_iter().map(|row| row.try_into_booking()).collect()
}

/// SurrealDB implementation of the booking repository.
#[derive(Clone)]
pub struct SurrealBookingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// A live booking of the same coach or the same learner in the range
    /// aborts the whole transaction. Bumping both schedule revisions makes
    /// two concurrent inserts for one coach or learner conflict at commit.
    async fn insert_guarded(&self, id: Uuid, input: &CreateBooking) -> Result<(), DbError> {
        let mut response = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 UPSERT type::record('schedule_rev', $coach_id) SET rev += 1; \
                 UPSERT type::record('schedule_rev', $learner_id) SET rev += 1; \
                 LET $clash = (SELECT VALUE id FROM booking \
                     WHERE (coach_id = $coach_id OR learner_id = $learner_id) \
                     AND status != 'Cancelled' \
                     AND start_at < $end AND end_at > $start); \
                 IF array::len($clash) > 0 { THROW 'coachdesk:overlap'; }; \
                 CREATE type::record('booking', $id) SET \
                     learner_id = $learner_id, coach_id = $coach_id, \
                     start_at = $start, end_at = $end, status = $status; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("learner_id", input.learner_id.to_string()))
            .bind(("coach_id", input.coach_id.to_string()))
            .bind(("start", input.range.start()))
            .bind(("end", input.range.end()))
            .bind(("status", input.status.as_str().to_string()))
            .await
            .map_err(DbError::from_statement)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(DbError::from_transaction(errors));
        }
        Ok(())
    }

    async fn live_overlapping(
        &self,
        owner_field: &str,
        owner_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Booking>, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM booking \
             WHERE {owner_field} = $owner_id AND status != 'Cancelled' \
             AND start_at < $end AND end_at > $start \
             ORDER BY start_at ASC"
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("owner_id", owner_id.to_string()))
            .bind(("start", range.start()))
            .bind(("end", range.end()))
            .await?;

        let rows: Vec<BookingRowWithId> = result.take(0)?;
        collect(rows)
    }
}

impl<C: Connection> BookingRepository for SurrealBookingRepository<C> {
    async fn create(&self, input: CreateBooking) -> CoachdeskResult<Booking> {
        let id = Uuid::new_v4();
        let input = &input;
        retry_on_contention("booking", || self.insert_guarded(id, input)).await?;
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CoachdeskResult<Booking> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('booking', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("booking", &id_str))?;

        Ok(row.into_booking(id)?)
    }

    async fn live_for_coach(&self, coach_id: Uuid, range: TimeRange) -> CoachdeskResult<Vec<Booking>> {
        Ok(self.live_overlapping("coach_id", coach_id, range).await?)
    }

    async fn live_for_learner(
        &self,
        learner_id: Uuid,
        range: TimeRange,
    ) -> CoachdeskResult<Vec<Booking>> {
        Ok(self.live_overlapping("learner_id", learner_id, range).await?)
    }

    async fn scheduled_for_learner(
        &self,
        learner_id: Uuid,
        after: DateTime<Utc>,
    ) -> CoachdeskResult<Vec<Booking>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE learner_id = $learner_id AND status = 'Scheduled' \
                 AND end_at > $after \
                 ORDER BY start_at ASC",
            )
            .bind(("learner_id", learner_id.to_string()))
            .bind(("after", after))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn list_for_learner(
        &self,
        learner_id: Uuid,
        pagination: Pagination,
    ) -> CoachdeskResult<PaginatedResult<Booking>> {
        let learner_str = learner_id.to_string();

        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM booking WHERE learner_id = $learner_id GROUP ALL")
            .bind(("learner_id", learner_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE learner_id = $learner_id \
                 ORDER BY start_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("learner_id", learner_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = collect(rows)?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> CoachdeskResult<Booking> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('booking', $id) SET \
                 status = $to, updated_at = time::now() \
                 WHERE status = $from",
            )
            .bind(("id", id_str.clone()))
            .bind(("from", from.as_str().to_string()))
            .bind(("to", to.as_str().to_string()))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_booking(id)?),
            None => {
                // Distinguish a missing booking from a lost race.
                let current = self.get_by_id(id).await?;
                Err(CoachdeskError::Conflict {
                    reason: format!(
                        "booking {id} is {} and can no longer move from {from}",
                        current.status
                    ),
                })
            }
        }
    }

    async fn close_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
        to: BookingStatus,
    ) -> CoachdeskResult<u64> {
        let mut result = self
            .db
            .query(
                "RETURN array::len((UPDATE booking SET \
                 status = $to, updated_at = time::now() \
                 WHERE status = 'Scheduled' AND end_at < $cutoff))",
            )
            .bind(("cutoff", cutoff))
            .bind(("to", to.as_str().to_string()))
            .await
            .map_err(DbError::from_statement)?;

        let changed: Option<i64> = result.take(0).map_err(DbError::from)?;
        Ok(changed.map(|n| n.max(0) as u64).unwrap_or(0))
    }

    async fn attendance_summary(&self, learner_id: Uuid) -> CoachdeskResult<AttendanceSummary> {
        let mut result = self
            .db
            .query(
                "SELECT status, count() AS total FROM booking \
                 WHERE learner_id = $learner_id GROUP BY status",
            )
            .bind(("learner_id", learner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;
        let mut summary = AttendanceSummary::default();
        for row in rows {
            summary.add(parse_status(&row.status)?, row.total);
        }

        Ok(summary)
    }
}
