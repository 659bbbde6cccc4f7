//! Single-use coach invite tokens.

use std::sync::Arc;

use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::invite::{CreateInviteToken, InviteToken};
use coachdesk_core::repository::InviteTokenRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulingConfig;
use crate::error::{BookingError, BookingResult};
use crate::token;

/// A freshly issued invite. `value` is shown once and never stored.
#[derive(Debug, Clone)]
pub struct IssuedInvite {
    pub token: InviteToken,
    pub value: String,
}

/// Issues and redeems coach invite tokens.
///
/// Generic over the repository so that this layer has no dependency on
/// the database crate.
pub struct InviteRegistry<T: InviteTokenRepository> {
    repo: T,
    config: SchedulingConfig,
    clock: Arc<dyn Clock>,
}

impl<T: InviteTokenRepository> InviteRegistry<T> {
    pub fn new(repo: T, config: SchedulingConfig) -> Self {
        Self {
            repo,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn issue(&self, note: Option<String>) -> BookingResult<IssuedInvite> {
        let value = token::generate_invite_token();
        let token = self
            .repo
            .create(CreateInviteToken {
                token_hash: token::hash_invite_token(&value),
                note,
                expires_at: self.clock.now() + self.config.invite_lifetime(),
            })
            .await?;

        info!(token_id = %token.id, expires_at = %token.expires_at, "invite token issued");
        Ok(IssuedInvite { token, value })
    }

    /// Mark the token behind `value` consumed. At most one caller ever
    /// succeeds for a given token.
    pub async fn consume(&self, value: &str) -> BookingResult<InviteToken> {
        let hash = token::hash_invite_token(value);
        match self.repo.consume(&hash, self.clock.now()).await {
            Ok(token) => {
                info!(token_id = %token.id, "invite token consumed");
                Ok(token)
            }
            Err(CoachdeskError::NotFound { .. } | CoachdeskError::Conflict { .. }) => {
                warn!("rejected invite token");
                Err(BookingError::InvalidToken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look a token up by its raw value.
    pub async fn get(&self, value: &str) -> BookingResult<InviteToken> {
        self.repo
            .get_by_hash(&token::hash_invite_token(value))
            .await
            .map_err(|e| match e {
                CoachdeskError::NotFound { .. } => BookingError::InvalidToken,
                other => other.into(),
            })
    }

    /// Delete tokens that expired without being used.
    pub async fn purge_expired(&self) -> BookingResult<u64> {
        let removed = self.repo.cleanup_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, "purged expired invite tokens");
        }
        Ok(removed)
    }

    pub(crate) async fn attach_coach(&self, token_id: Uuid, coach_id: Uuid) -> BookingResult<()> {
        self.repo.attach_coach(token_id, coach_id).await?;
        Ok(())
    }

    pub(crate) async fn release(&self, token_id: Uuid) -> BookingResult<()> {
        self.repo.release(token_id).await?;
        Ok(())
    }
}
