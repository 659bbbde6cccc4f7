//! Learner and coach accounts: registration, profile edits and lookup.
//!
//! Learners sign up freely; coaches need an invite token, which is consumed
//! before the coach account is written and released again if that write
//! fails.

use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::coach::{Coach, CreateCoach, UpdateCoach};
use coachdesk_core::models::learner::{CreateLearner, Learner, UpdateLearner};
use coachdesk_core::repository::{
    CoachRepository, InviteTokenRepository, LearnerRepository, PaginatedResult, Pagination,
};
use tracing::{debug, error, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{BookingError, BookingResult};
use crate::invites::InviteRegistry;
use crate::validation;

pub const MAX_SEARCH_RESULTS: u64 = 50;

pub struct AccountService<C: CoachRepository, L: LearnerRepository, T: InviteTokenRepository> {
    coaches: C,
    learners: L,
    invites: InviteRegistry<T>,
}

impl<C, L, T> AccountService<C, L, T>
where
    C: CoachRepository,
    L: LearnerRepository,
    T: InviteTokenRepository,
{
    pub fn new(coaches: C, learners: L, invites: InviteRegistry<T>) -> Self {
        Self {
            coaches,
            learners,
            invites,
        }
    }

    pub fn invites(&self) -> &InviteRegistry<T> {
        &self.invites
    }

    pub async fn register_learner(&self, input: CreateLearner) -> BookingResult<Learner> {
        let input = validation::normalize_learner(input);
        input.validate()?;
        self.ensure_email_free(&input.email).await?;

        let learner = self.learners.create(input).await.map_err(email_taken)?;
        info!(learner_id = %learner.id, "learner registered");
        Ok(learner)
    }

    /// Register a coach with the invite token `invite`.
    pub async fn register_coach(&self, invite: &str, input: CreateCoach) -> BookingResult<Coach> {
        let input = validation::normalize_coach(input);
        input.validate()?;
        self.ensure_email_free(&input.email).await?;

        let token = self.invites.consume(invite).await?;

        let coach = match self.coaches.create(input).await {
            Ok(coach) => coach,
            Err(e) => {
                if let Err(release_err) = self.invites.release(token.id).await {
                    error!(token_id = %token.id, error = %release_err, "failed to release invite token");
                }
                return Err(email_taken(e));
            }
        };

        self.invites.attach_coach(token.id, coach.id).await?;
        info!(
            coach_id = %coach.id,
            name = %coach.display_name(),
            token_id = %token.id,
            "coach registered"
        );
        Ok(coach)
    }

    pub async fn set_learner_grade(&self, learner_id: Uuid, grade: u8) -> BookingResult<Learner> {
        let update = UpdateLearner {
            current_grade: Some(grade),
            ..Default::default()
        };
        update.validate()?;
        let learner = self.learners.update(learner_id, update).await?;
        info!(%learner_id, grade, "learner grade updated");
        Ok(learner)
    }

    /// Edit the coach's `about` text and phone number.
    pub async fn update_coach_profile(
        &self,
        coach_id: Uuid,
        input: UpdateCoach,
    ) -> BookingResult<Coach> {
        let input = validation::normalize_profile(input);
        input.validate()?;
        let coach = self.coaches.update_profile(coach_id, input).await?;
        info!(%coach_id, "coach profile updated");
        Ok(coach)
    }

    /// Learners whose name or email contains `query`, ignoring case.
    /// A blank query finds nobody; at most [`MAX_SEARCH_RESULTS`] come back.
    pub async fn search_learners(&self, query: &str, limit: u64) -> BookingResult<Vec<Learner>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let limit = limit.min(MAX_SEARCH_RESULTS);
        let learners = self.learners.search(&query, limit).await?;
        debug!(%query, found = learners.len(), "learner search");
        Ok(learners)
    }

    pub async fn coach(&self, coach_id: Uuid) -> BookingResult<Coach> {
        Ok(self.coaches.get_by_id(coach_id).await?)
    }

    pub async fn learner(&self, learner_id: Uuid) -> BookingResult<Learner> {
        Ok(self.learners.get_by_id(learner_id).await?)
    }

    pub async fn coaches(&self, pagination: Pagination) -> BookingResult<PaginatedResult<Coach>> {
        Ok(self.coaches.list(pagination).await?)
    }

    /// Emails are unique across learners and coaches.
    async fn ensure_email_free(&self, email: &str) -> BookingResult<()> {
        let in_learners = found(self.learners.get_by_email(email).await)?;
        let in_coaches = found(self.coaches.get_by_email(email).await)?;
        if in_learners || in_coaches {
            return Err(BookingError::Validation("email already in use".into()));
        }
        Ok(())
    }
}

fn found<T>(lookup: Result<T, CoachdeskError>) -> BookingResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(CoachdeskError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn email_taken(err: CoachdeskError) -> BookingError {
    match err {
        CoachdeskError::AlreadyExists { .. } => BookingError::Validation("email already in use".into()),
        other => other.into(),
    }
}
