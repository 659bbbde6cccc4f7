//! Per-participant serialization of schedule writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

type LockTable = Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>;

/// One async mutex per coach or learner id, created on first use and
/// dropped from the table once nobody holds or waits on it.
///
/// Clones share the same table, so an [`AvailabilityStore`] and a
/// [`BookingScheduler`] built from clones of one `ScheduleLocks` exclude
/// each other.
///
/// [`AvailabilityStore`]: crate::availability::AvailabilityStore
/// [`BookingScheduler`]: crate::scheduler::BookingScheduler
#[derive(Debug, Clone, Default)]
pub struct ScheduleLocks {
    inner: LockTable,
}

/// Exclusive access to one or more schedules. Released on drop.
#[derive(Debug)]
pub struct ScheduleGuard {
    table: LockTable,
    held: Vec<(Uuid, OwnedMutexGuard<()>)>,
}

impl ScheduleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the schedule of `id`.
    pub async fn acquire(&self, id: Uuid) -> ScheduleGuard {
        self.acquire_all(&[id]).await
    }

    /// Wait for exclusive access to several schedules at once.
    ///
    /// Locks are taken in ascending id order, so two callers asking for
    /// overlapping sets cannot deadlock.
    pub async fn acquire_all(&self, ids: &[Uuid]) -> ScheduleGuard {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guard = ScheduleGuard {
            table: Arc::clone(&self.inner),
            held: Vec::with_capacity(ids.len()),
        };
        for id in ids {
            let lock = {
                let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                Arc::clone(table.entry(id).or_default())
            };
            guard.held.push((id, lock.lock_owned().await));
        }
        guard
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for ScheduleGuard {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        for (id, held) in self.held.drain(..) {
            drop(held);
            // Only the table's own handle left: no holder, no waiter.
            if table.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                table.remove(&id);
            }
        }
    }
}
