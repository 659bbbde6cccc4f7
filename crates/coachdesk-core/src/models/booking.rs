//! Booking domain model and its attendance state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::TimeRange;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Scheduled,
    Attended,
    NoShow,
    Cancelled,
}

impl BookingStatus {
    /// Attended, no-show and cancelled bookings never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Scheduled)
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (
                BookingStatus::Scheduled,
                BookingStatus::Attended | BookingStatus::NoShow | BookingStatus::Cancelled
            )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "Scheduled",
            BookingStatus::Attended => "Attended",
            BookingStatus::NoShow => "NoShow",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Scheduled" => Some(BookingStatus::Scheduled),
            "Attended" => Some(BookingStatus::Attended),
            "NoShow" => Some(BookingStatus::NoShow),
            "Cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub coach_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn range(&self) -> TimeRange {
        TimeRange::unchecked(self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub learner_id: Uuid,
    pub coach_id: Uuid,
    pub range: TimeRange,
    /// `Scheduled` for live bookings; history imports may start terminal.
    pub status: BookingStatus,
}

/// Per-learner counts of booking outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub scheduled: u64,
    pub attended: u64,
    pub no_show: u64,
    pub cancelled: u64,
}

impl AttendanceSummary {
    pub fn record(&mut self, status: BookingStatus) {
        self.add(status, 1);
    }

    pub fn add(&mut self, status: BookingStatus, count: u64) {
        let slot = match status {
            BookingStatus::Scheduled => &mut self.scheduled,
            BookingStatus::Attended => &mut self.attended,
            BookingStatus::NoShow => &mut self.no_show,
            BookingStatus::Cancelled => &mut self.cancelled,
        };
        *slot += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_scheduled_moves() {
        use BookingStatus::*;
        for next in [Attended, NoShow, Cancelled] {
            assert!(Scheduled.can_transition_to(next));
        }
        for from in [Attended, NoShow, Cancelled] {
            assert!(from.is_terminal());
            for next in [Scheduled, Attended, NoShow, Cancelled] {
                assert!(!from.can_transition_to(next), "{from} -> {next}");
            }
        }
        assert!(!Scheduled.can_transition_to(Scheduled));
    }

    #[test]
    fn status_strings_parse_back() {
        for s in ["Scheduled", "Attended", "NoShow", "Cancelled"] {
            assert_eq!(BookingStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(BookingStatus::parse("booked").is_none());
    }

    #[test]
    fn summary_counts_each_status() {
        let mut summary = AttendanceSummary::default();
        summary.record(BookingStatus::Attended);
        summary.record(BookingStatus::Attended);
        summary.record(BookingStatus::NoShow);
        summary.record(BookingStatus::Cancelled);
        assert_eq!(
            summary,
            AttendanceSummary {
                scheduled: 0,
                attended: 2,
                no_show: 1,
                cancelled: 1,
            }
        );
    }
}
