//! Coach availability domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::TimeRange;

/// An open window a coach has published for booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    pub fn range(&self) -> TimeRange {
        TimeRange::unchecked(self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilitySlot {
    pub coach_id: Uuid,
    pub range: TimeRange,
}
