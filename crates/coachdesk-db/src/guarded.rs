//! Retry loop for guarded multi-statement writes.

use tracing::debug;

use crate::error::DbError;

/// Runs per guarded write before contention is reported as a conflict.
pub(crate) const GUARDED_WRITE_ATTEMPTS: usize = 8;

/// Run `write` until it commits or fails for a reason other than losing a
/// commit race. Every run re-evaluates the overlap guard, so a retry that
/// now clashes with the winner fails with `Conflict`.
pub(crate) async fn retry_on_contention<F, Fut>(table: &str, mut write: F) -> Result<(), DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), DbError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(DbError::Contention(reason)) if attempt < GUARDED_WRITE_ATTEMPTS => {
                debug!(table, attempt, %reason, "guarded write lost a commit race, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}
