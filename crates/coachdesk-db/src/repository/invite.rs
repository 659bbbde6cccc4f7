//! SurrealDB implementation of [`InviteTokenRepository`].

use chrono::{DateTime, Utc};
use coachdesk_core::error::CoachdeskResult;
use coachdesk_core::models::invite::{CreateInviteToken, InviteToken};
use coachdesk_core::repository::InviteTokenRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::rows::{CountRow, parse_uuid};

#[derive(Debug, SurrealValue)]
struct InviteRow {
    token_hash: String,
    note: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed: bool,
    consumed_at: Option<DateTime<Utc>>,
    consumed_by: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct InviteRowWithId {
    record_id: String,
    token_hash: String,
    note: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed: bool,
    consumed_at: Option<DateTime<Utc>>,
    consumed_by: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

impl InviteRow {
    fn into_token(self, id: Uuid) -> Result<InviteToken, DbError> {
        let consumed_by = self
            .consumed_by
            .as_deref()
            .map(|raw| parse_uuid(raw, "coach"))
            .transpose()?;
        Ok(InviteToken {
            id,
            token_hash: self.token_hash,
            note: self.note,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            consumed: self.consumed,
            consumed_at: self.consumed_at,
            consumed_by,
        })
    }
}

impl InviteRowWithId {
    fn try_into_token(self) -> Result<InviteToken, DbError> {
        let id = parse_uuid(&self.record_id, "invite token")?;
        InviteRow {
            token_hash: self.token_hash,
            note: self.note,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            consumed: self.consumed,
            consumed_at: self.consumed_at,
            consumed_by: self.consumed_by,
        }
        .into_token(id)
    }
}

/// SurrealDB implementation of the invite token repository.
#[derive(Clone)]
pub struct SurrealInviteTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInviteTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn id_for_hash(&self, token_hash: &str) -> Result<Uuid, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM invite_token WHERE token_hash = $hash")
            .bind(("hash", token_hash.to_string()))
            .await?;

        let rows: Vec<IdRow> = result.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("invite_token", "hash"))?;
        parse_uuid(&row.record_id, "invite token")
    }
}

impl<C: Connection> InviteTokenRepository for SurrealInviteTokenRepository<C> {
    async fn create(&self, input: CreateInviteToken) -> CoachdeskResult<InviteToken> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('invite_token', $id) SET \
                 token_hash = $token_hash, note = $note, \
                 expires_at = $expires_at, consumed = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("token_hash", input.token_hash))
            .bind(("note", input.note))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("invite_token", &id_str))?;

        Ok(row.into_token(id)?)
    }

    async fn get_by_hash(&self, token_hash: &str) -> CoachdeskResult<InviteToken> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invite_token \
                 WHERE token_hash = $hash",
            )
            .bind(("hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InviteRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("invite_token", "hash"))?;

        Ok(row.try_into_token()?)
    }

    async fn consume(&self, token_hash: &str, now: DateTime<Utc>) -> CoachdeskResult<InviteToken> {
        let id = self.id_for_hash(token_hash).await?;
        let id_str = id.to_string();

        // The WHERE clause is evaluated and the write applied in one
        // statement, so at most one caller sees the updated row.
        let result = self
            .db
            .query(
                "UPDATE type::record('invite_token', $id) SET \
                 consumed = true, consumed_at = $now \
                 WHERE consumed = false AND expires_at > $now",
            )
            .bind(("id", id_str.clone()))
            .bind(("now", now))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            debug!(token_id = %id, "invite token not redeemable");
            DbError::not_found("invite_token", &id_str)
        })?;

        Ok(row.into_token(id)?)
    }

    async fn attach_coach(&self, id: Uuid, coach_id: Uuid) -> CoachdeskResult<InviteToken> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('invite_token', $id) SET consumed_by = $coach_id \
                 WHERE consumed = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("coach_id", coach_id.to_string()))
            .await
            .map_err(DbError::from_statement)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<InviteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("invite_token", &id_str))?;

        Ok(row.into_token(id)?)
    }

    async fn release(&self, id: Uuid) -> CoachdeskResult<()> {
        self.db
            .query(
                "UPDATE type::record('invite_token', $id) SET \
                 consumed = false, consumed_at = NONE \
                 WHERE consumed = true AND consumed_by = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from_statement)?
            .check()
            .map_err(DbError::from_statement)?;

        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> CoachdeskResult<u64> {
        // Count first, then delete.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM invite_token \
                 WHERE consumed = false AND expires_at <= $now \
                 GROUP ALL",
            )
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE invite_token WHERE consumed = false AND expires_at <= $now")
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
