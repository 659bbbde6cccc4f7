//! Coach invite token domain model.
//!
//! Invite tokens gate coach self-registration. The raw token value is
//! handed out once at issue time; only its SHA-256 digest is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteToken {
    pub id: Uuid,
    /// Hex-encoded SHA-256 of the raw token value.
    pub token_hash: String,
    /// Free-form note from the issuer (e.g. who the invite is for).
    pub note: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
    /// Coach account created with this token, once registration finished.
    pub consumed_by: Option<Uuid>,
}

impl InviteToken {
    /// Whether the token could still be consumed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && self.expires_at > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInviteToken {
    pub token_hash: String,
    pub note: Option<String>,
    pub expires_at: DateTime<Utc>,
}
