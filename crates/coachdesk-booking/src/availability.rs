//! Coach availability: publishing slots and answering "when is this coach
//! free?" queries.

use chrono::{DateTime, NaiveDate, Utc};
use coachdesk_core::error::CoachdeskError;
use coachdesk_core::models::availability::{AvailabilitySlot, CreateAvailabilitySlot};
use coachdesk_core::models::booking::Booking;
use coachdesk_core::repository::{AvailabilityRepository, BookingRepository};
use coachdesk_core::schedule::{TimeRange, WeeklyWindow, free_windows};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult, checked_range};
use crate::locks::ScheduleLocks;

pub struct AvailabilityStore<A: AvailabilityRepository, B: BookingRepository> {
    slots: A,
    bookings: B,
    locks: ScheduleLocks,
}

impl<A: AvailabilityRepository, B: BookingRepository> AvailabilityStore<A, B> {
    /// `locks` must be shared with the [`BookingScheduler`] working on the
    /// same storage.
    ///
    /// [`BookingScheduler`]: crate::scheduler::BookingScheduler
    pub fn new(slots: A, bookings: B, locks: ScheduleLocks) -> Self {
        Self {
            slots,
            bookings,
            locks,
        }
    }

    pub async fn add_slot(
        &self,
        coach_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<AvailabilitySlot> {
        let range = checked_range(start, end)?;
        let _guard = self.locks.acquire(coach_id).await;
        self.insert(coach_id, range).await
    }

    /// Expand `windows` into concrete slots for `weeks` weeks from
    /// `from`. Occurrences that overlap an existing slot are skipped, so
    /// repeating the call adds nothing.
    pub async fn add_weekly(
        &self,
        coach_id: Uuid,
        windows: &[WeeklyWindow],
        from: NaiveDate,
        weeks: u32,
    ) -> BookingResult<Vec<AvailabilitySlot>> {
        let mut wanted: Vec<TimeRange> = windows
            .iter()
            .flat_map(|w| w.occurrences(from, weeks))
            .collect();
        wanted.sort_by_key(|r| r.start());

        let _guard = self.locks.acquire(coach_id).await;
        let mut created = Vec::new();
        for range in wanted {
            if !self.slots.list_overlapping(coach_id, range).await?.is_empty() {
                debug!(%coach_id, start = %range.start(), "weekly occurrence already covered");
                continue;
            }
            created.push(self.insert(coach_id, range).await?);
        }

        info!(%coach_id, created = created.len(), "weekly availability expanded");
        Ok(created)
    }

    /// Remove a slot nobody is booked into.
    pub async fn remove_slot(&self, slot_id: Uuid) -> BookingResult<()> {
        let slot = self.slots.get_by_id(slot_id).await?;
        let _guard = self.locks.acquire(slot.coach_id).await;

        let live = self.bookings.live_for_coach(slot.coach_id, slot.range()).await?;
        if !live.is_empty() {
            return Err(BookingError::SlotInUse);
        }

        self.slots.delete(slot_id).await?;
        info!(%slot_id, coach_id = %slot.coach_id, "availability slot removed");
        Ok(())
    }

    /// Open windows of `coach_id` within `[start, end)`: slot time not
    /// taken by a live booking, ordered by start.
    pub async fn query(
        &self,
        coach_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<Vec<TimeRange>> {
        let bounds = checked_range(start, end)?;
        let slots: Vec<TimeRange> = self
            .slots
            .list_overlapping(coach_id, bounds)
            .await?
            .iter()
            .map(AvailabilitySlot::range)
            .collect();
        let busy: Vec<TimeRange> = self
            .bookings
            .live_for_coach(coach_id, bounds)
            .await?
            .iter()
            .map(Booking::range)
            .collect();

        Ok(free_windows(&slots, &busy, &bounds))
    }

    /// Raw slots of `coach_id` intersecting `[start, end)`.
    pub async fn slots(
        &self,
        coach_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingResult<Vec<AvailabilitySlot>> {
        let bounds = checked_range(start, end)?;
        Ok(self.slots.list_overlapping(coach_id, bounds).await?)
    }

    /// Caller holds the coach lock.
    async fn insert(&self, coach_id: Uuid, range: TimeRange) -> BookingResult<AvailabilitySlot> {
        match self
            .slots
            .create(CreateAvailabilitySlot { coach_id, range })
            .await
        {
            Ok(slot) => {
                debug!(slot_id = %slot.id, %coach_id, "availability slot added");
                Ok(slot)
            }
            Err(CoachdeskError::Conflict { .. }) => Err(BookingError::SlotOverlap),
            Err(e) => Err(e.into()),
        }
    }
}
