//! Helpers shared by the row structs of every repository.

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_small(raw: i64, what: &str) -> Result<u8, DbError> {
    u8::try_from(raw).map_err(|_| DbError::Corrupt(format!("{what} out of range: {raw}")))
}
