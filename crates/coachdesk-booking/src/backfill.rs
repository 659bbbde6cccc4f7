//! Seeding past attended sessions for an existing learner.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveTime};
use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::availability::CreateAvailabilitySlot;
use coachdesk_core::models::booking::{BookingStatus, CreateBooking};
use coachdesk_core::models::coach::Coach;
use coachdesk_core::repository::{
    AvailabilityRepository, BookingRepository, CoachRepository, LearnerRepository, Pagination,
};
use coachdesk_core::schedule::TimeRange;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{BookingError, BookingResult};
use crate::locks::ScheduleLocks;
use crate::validation;

/// Hour of day (UTC) at which backfilled sessions start.
const SESSION_HOUR: u32 = 16;
const SESSION_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub created: u64,
    pub skipped: u64,
}

pub struct HistoryBackfill<L, C, A, B>
where
    L: LearnerRepository,
    C: CoachRepository,
    A: AvailabilityRepository,
    B: BookingRepository,
{
    learners: L,
    coaches: C,
    slots: A,
    bookings: B,
    locks: ScheduleLocks,
    clock: Arc<dyn Clock>,
}

impl<L, C, A, B> HistoryBackfill<L, C, A, B>
where
    L: LearnerRepository,
    C: CoachRepository,
    A: AvailabilityRepository,
    B: BookingRepository,
{
    pub fn new(learners: L, coaches: C, slots: A, bookings: B, locks: ScheduleLocks) -> Self {
        Self {
            learners,
            coaches,
            slots,
            bookings,
            locks,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create `per_week` attended one-hour sessions in each of the last
    /// `weeks` weeks for the learner with `email`, rotating through
    /// coaches. Sessions fall on consecutive days from each week's Monday.
    pub async fn backfill_history(
        &self,
        email: &str,
        weeks: u32,
        per_week: u32,
    ) -> BookingResult<BackfillReport> {
        if per_week > 7 {
            return Err(BookingError::Validation(
                "at most 7 sessions per week can be backfilled".into(),
            ));
        }
        let learner = self
            .learners
            .get_by_email(&validation::normalize_email(email))
            .await?;
        let coaches = self.all_coaches().await?;
        if coaches.is_empty() {
            return Err(BookingError::Validation("no coaches to backfill with".into()));
        }

        let today = self.clock.now().date_naive();
        let this_monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let start_time = NaiveTime::from_hms_opt(SESSION_HOUR, 0, 0)
            .ok_or_else(|| BookingError::Validation("invalid session hour".into()))?;

        let earliest = Duration::try_weeks(i64::from(weeks))
            .and_then(|span| this_monday.checked_sub_signed(span))
            .ok_or_else(|| BookingError::Validation(format!("cannot backfill {weeks} weeks")))?;

        let mut report = BackfillReport::default();
        let mut turn = 0usize;
        for week in (0..weeks).rev() {
            let monday = earliest + Duration::weeks(i64::from(week));
            for day in 0..per_week {
                let coach = &coaches[turn % coaches.len()];
                turn += 1;

                let start = (monday + Duration::days(i64::from(day)))
                    .and_time(start_time)
                    .and_utc();
                let range = TimeRange::new(start, start + Duration::minutes(SESSION_MINUTES))?;

                if self.backfill_one(learner.id, coach.id, range).await? {
                    report.created += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        info!(
            learner_id = %learner.id,
            weeks,
            per_week,
            created = report.created,
            skipped = report.skipped,
            "history backfill finished"
        );
        Ok(report)
    }

    /// Returns `false` when the occurrence was skipped.
    async fn backfill_one(&self, learner_id: Uuid, coach_id: Uuid, range: TimeRange) -> BookingResult<bool> {
        let _guard = self.locks.acquire_all(&[coach_id, learner_id]).await;

        let existing = self.slots.list_overlapping(coach_id, range).await?;
        if existing.is_empty() {
            match self
                .slots
                .create(CreateAvailabilitySlot { coach_id, range })
                .await
            {
                Ok(_) => {}
                Err(CoachdeskError::Conflict { .. }) => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        } else if !existing.iter().any(|slot| slot.range().contains(&range)) {
            debug!(%coach_id, start = %range.start(), "backfill slot clashes with availability");
            return Ok(false);
        }

        match self
            .bookings
            .create(CreateBooking {
                learner_id,
                coach_id,
                range,
                status: BookingStatus::Attended,
            })
            .await
        {
            Ok(_) => Ok(true),
            Err(CoachdeskError::Conflict { .. }) => {
                debug!(%coach_id, %learner_id, start = %range.start(), "backfill booking clashes");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn all_coaches(&self) -> BookingResult<Vec<Coach>> {
        let mut coaches = Vec::new();
        let mut pagination = Pagination::default();
        loop {
            let page = self.coaches.list(pagination.clone()).await?;
            let fetched = page.items.len() as u64;
            coaches.extend(page.items);
            if fetched == 0 || coaches.len() as u64 >= page.total {
                return Ok(coaches);
            }
            pagination.offset += fetched;
        }
    }
}
