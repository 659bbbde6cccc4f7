//! Database-specific error types and conversions.

use std::collections::HashMap;

use coachdesk_core::error::CoachdeskError;

/// Message thrown by guarded writes when the new record would overlap an
/// existing one.
pub(crate) const OVERLAP_MARKER: &str = "coachdesk:overlap";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Schema setup failed: {0}")]
    Schema(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    /// The transaction lost a commit race and may succeed if run again.
    #[error("Transaction contention: {0}")]
    Contention(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl DbError {
    /// Classify an error raised while executing or checking a statement.
    ///
    /// Overlap guards become `Conflict`, lost commit races `Contention`,
    /// unique index violations `Duplicate`.
    pub(crate) fn from_statement(err: surrealdb::Error) -> Self {
        Self::from_message(err.to_string())
    }

    fn from_message(message: String) -> Self {
        if message.contains(OVERLAP_MARKER) {
            DbError::Conflict(message)
        } else if is_contention(&message) {
            DbError::Contention(message)
        } else if message.contains("already contains") {
            DbError::Duplicate(message)
        } else {
            DbError::Query(message)
        }
    }

    /// Classify the errors of a multi-statement transaction.
    ///
    /// A failed transaction reports an error for every statement, so the
    /// one carrying the real cause has to be picked out by message.
    pub(crate) fn from_transaction(errors: HashMap<usize, surrealdb::Error>) -> Self {
        let mut errors: Vec<(usize, surrealdb::Error)> = errors.into_iter().collect();
        errors.sort_by_key(|(index, _)| *index);
        let messages: Vec<String> = errors.iter().map(|(_, e)| e.to_string()).collect();
        let cause = messages
            .iter()
            .position(|m| m.contains(OVERLAP_MARKER) || m.contains("already contains"))
            .or_else(|| messages.iter().position(|m| is_contention(m)))
            .unwrap_or(0);
        match errors.into_iter().nth(cause) {
            Some((_, err)) => Self::from_statement(err),
            None => DbError::Query("transaction failed without an error".into()),
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

fn is_contention(message: &str) -> bool {
    message.contains("conflict") || message.contains("can be retried")
}

impl From<DbError> for CoachdeskError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoachdeskError::NotFound { entity, id },
            DbError::Conflict(reason) | DbError::Contention(reason) => {
                CoachdeskError::Conflict { reason }
            }
            DbError::Duplicate(entity) => CoachdeskError::AlreadyExists { entity },
            other => CoachdeskError::Database(other.to_string()),
        }
    }
}
