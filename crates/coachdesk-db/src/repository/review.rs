//! SurrealDB implementation of [`ReviewRepository`].
//!
//! The `review` table denies UPDATE and DELETE at the schema level and this
//! repository exposes neither.

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskResult;
use coachdesk_core::models::review::{CreateReview, Review};
use coachdesk_core::repository::{PaginatedResult, Pagination, ReviewRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{CountRow, parse_small, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ReviewRow {
    booking_id: String,
    coach_id: String,
    learner_id: String,
    rating: i64,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ReviewRowWithId {
    record_id: String,
    booking_id: String,
    coach_id: String,
    learner_id: String,
    rating: i64,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self, id: Uuid) -> Result<Review, DbError> {
        Ok(Review {
            id,
            booking_id: parse_uuid(&self.booking_id, "booking")?,
            coach_id: parse_uuid(&self.coach_id, "coach")?,
            learner_id: parse_uuid(&self.learner_id, "learner")?,
            rating: parse_small(self.rating, "rating")?,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

impl ReviewRowWithId {
    fn try_into_review(self) -> Result<Review, DbError> {
        let id = parse_uuid(&self.record_id, "review")?;
        ReviewRow {
            booking_id: self.booking_id,
            coach_id: self.coach_id,
            learner_id: self.learner_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        }
        .into_review(id)
    }
}

/// SurrealDB implementation of the review repository.
#[derive(Clone)]
pub struct SurrealReviewRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReviewRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReviewRepository for SurrealReviewRepository<C> {
    async fn create(&self, input: CreateReview) -> CoachdeskResult<Review> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('review', $id) SET \
                 booking_id = $booking_id, coach_id = $coach_id, \
                 learner_id = $learner_id, rating = $rating, \
                 comment = $comment",
            )
            .bind(("id", id_str.clone()))
            .bind(("booking_id", input.booking_id.to_string()))
            .bind(("coach_id", input.coach_id.to_string()))
            .bind(("learner_id", input.learner_id.to_string()))
            .bind(("rating", i64::from(input.rating)))
            .bind(("comment", input.comment))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<ReviewRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("review", &id_str))?;

        Ok(row.into_review(id)?)
    }

    async fn get_by_booking(&self, booking_id: Uuid) -> CoachdeskResult<Review> {
        let booking_str = booking_id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM review WHERE booking_id = $booking_id")
            .bind(("booking_id", booking_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("review", format!("booking={booking_str}")))?;

        Ok(row.try_into_review()?)
    }

    async fn list_for_coach(
        &self,
        coach_id: Uuid,
        pagination: Pagination,
    ) -> CoachdeskResult<PaginatedResult<Review>> {
        let coach_str = coach_id.to_string();

        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM review WHERE coach_id = $coach_id GROUP ALL")
            .bind(("coach_id", coach_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM review \
                 WHERE coach_id = $coach_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("coach_id", coach_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReviewRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_review())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn ratings_for_coach(&self, coach_id: Uuid) -> CoachdeskResult<Vec<u8>> {
        let mut result = self
            .db
            .query("SELECT VALUE rating FROM review WHERE coach_id = $coach_id")
            .bind(("coach_id", coach_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let raw: Vec<i64> = result.take(0).map_err(DbError::from)?;
        let ratings = raw
            .into_iter()
            .map(|r| parse_small(r, "rating"))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(ratings)
    }
}
