//! SurrealDB implementation of [`LearnerRepository`].

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskResult;
use coachdesk_core::models::learner::{CreateLearner, Learner, UpdateLearner};
use coachdesk_core::repository::LearnerRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{parse_small, parse_uuid};

#[derive(Debug, SurrealValue)]
struct LearnerRow {
    first_name: String,
    last_name: String,
    email: String,
    gender: String,
    age: i64,
    emergency_contact: String,
    current_grade: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct LearnerRowWithId {
    record_id: String,
    first_name: String,
    last_name: String,
    email: String,
    gender: String,
    age: i64,
    emergency_contact: String,
    current_grade: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LearnerRow {
    fn into_learner(self, id: Uuid) -> Result<Learner, DbError> {
        Ok(Learner {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            gender: self.gender,
            age: parse_small(self.age, "age")?,
            emergency_contact: self.emergency_contact,
            current_grade: parse_small(self.current_grade, "grade")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl LearnerRowWithId {
    fn try_into_learner(self) -> Result<Learner, DbError> {
        let id = parse_uuid(&self.record_id, "learner")?;
        LearnerRow {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            gender: self.gender,
            age: self.age,
            emergency_contact: self.emergency_contact,
            current_grade: self.current_grade,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_learner(id)
    }
}

/// SurrealDB implementation of the Learner repository.
#[derive(Clone)]
pub struct SurrealLearnerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLearnerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> LearnerRepository for SurrealLearnerRepository<C> {
    async fn create(&self, input: CreateLearner) -> CoachdeskResult<Learner> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('learner', $id) SET \
                 first_name = $first_name, last_name = $last_name, \
                 email = $email, gender = $gender, age = $age, \
                 emergency_contact = $emergency_contact, \
                 current_grade = $current_grade",
            )
            .bind(("id", id_str.clone()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", input.email))
            .bind(("gender", input.gender))
            .bind(("age", i64::from(input.age)))
            .bind(("emergency_contact", input.emergency_contact))
            .bind(("current_grade", i64::from(input.current_grade)))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<LearnerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("learner", &id_str))?;

        Ok(row.into_learner(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CoachdeskResult<Learner> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('learner', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LearnerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("learner", &id_str))?;

        Ok(row.into_learner(id)?)
    }

    async fn get_by_email(&self, email: &str) -> CoachdeskResult<Learner> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM learner WHERE email = $email")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LearnerRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("learner", format!("email={email}")))?;

        Ok(row.try_into_learner()?)
    }

    async fn update(&self, id: Uuid, input: UpdateLearner) -> CoachdeskResult<Learner> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.emergency_contact.is_some() {
            sets.push("emergency_contact = $emergency_contact");
        }
        if input.current_grade.is_some() {
            sets.push("current_grade = $current_grade");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('learner', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(emergency_contact) = input.emergency_contact {
            builder = builder.bind(("emergency_contact", emergency_contact));
        }
        if let Some(current_grade) = input.current_grade {
            builder = builder.bind(("current_grade", i64::from(current_grade)));
        }

        let result = builder.await.map_err(DbError::from_statement)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<LearnerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("learner", &id_str))?;

        Ok(row.into_learner(id)?)
    }

    async fn search(&self, query: &str, limit: u64) -> CoachdeskResult<Vec<Learner>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM learner \
                 WHERE string::contains(string::lowercase(first_name), $q) \
                 OR string::contains(string::lowercase(last_name), $q) \
                 OR string::contains(email, $q) \
                 ORDER BY last_name ASC, first_name ASC \
                 LIMIT $limit",
            )
            .bind(("q", query.to_string()))
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LearnerRowWithId> = result.take(0).map_err(DbError::from)?;
        let learners = rows
            .into_iter()
            .map(|row| row.try_into_learner())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(learners)
    }
}
