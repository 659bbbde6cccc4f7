//! SurrealDB implementation of [`CoachRepository`].

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskResult;
use coachdesk_core::models::coach::{Coach, CreateCoach, UpdateCoach};
use coachdesk_core::repository::{CoachRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{CountRow, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CoachRow {
    title: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    about: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CoachRowWithId {
    record_id: String,
    title: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    about: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CoachRow {
    fn into_coach(self, id: Uuid) -> Coach {
        Coach {
            id,
            title: self.title,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            about: self.about,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CoachRowWithId {
    fn try_into_coach(self) -> Result<Coach, DbError> {
        let id = parse_uuid(&self.record_id, "coach")?;
        Ok(Coach {
            id,
            title: self.title,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            about: self.about,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Coach repository.
#[derive(Clone)]
pub struct SurrealCoachRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCoachRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CoachRepository for SurrealCoachRepository<C> {
    async fn create(&self, input: CreateCoach) -> CoachdeskResult<Coach> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('coach', $id) SET \
                 title = $title, \
                 first_name = $first_name, last_name = $last_name, \
                 email = $email, phone = $phone, about = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CoachRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("coach", &id_str))?;

        Ok(row.into_coach(id))
    }

    async fn get_by_id(&self, id: Uuid) -> CoachdeskResult<Coach> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('coach', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CoachRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("coach", &id_str))?;

        Ok(row.into_coach(id))
    }

    async fn get_by_email(&self, email: &str) -> CoachdeskResult<Coach> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM coach WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CoachRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("coach", format!("email={email}")))?;

        Ok(row.try_into_coach()?)
    }

    async fn list(&self, pagination: Pagination) -> CoachdeskResult<PaginatedResult<Coach>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM coach GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM coach \
                 ORDER BY last_name ASC, first_name ASC, email ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CoachRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_coach())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update_profile(&self, id: Uuid, input: UpdateCoach) -> CoachdeskResult<Coach> {
        let id_str = id.to_string();

        let about = input.about.map(|a| (!a.is_empty()).then_some(a));
        let phone = input.phone.map(|p| (!p.is_empty()).then_some(p));

        let mut sets = Vec::new();
        match &about {
            Some(Some(_)) => sets.push("about = $about"),
            Some(None) => sets.push("about = NONE"),
            None => {}
        }
        match &phone {
            Some(Some(_)) => sets.push("phone = $phone"),
            Some(None) => sets.push("phone = NONE"),
            None => {}
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('coach', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(Some(about)) = about {
            builder = builder.bind(("about", about));
        }
        if let Some(Some(phone)) = phone {
            builder = builder.bind(("phone", phone));
        }

        let result = builder.await.map_err(DbError::from_statement)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CoachRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("coach", &id_str))?;

        Ok(row.into_coach(id))
    }
}
