//! Half-open time ranges and the interval arithmetic behind availability
//! queries and conflict detection.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CoachdeskError, CoachdeskResult};

/// A non-empty interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Returns a validation error unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoachdeskResult<Self> {
        if start >= end {
            return Err(CoachdeskError::validation(format!(
                "time range must end after it starts ({start} >= {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// For ranges read back from storage, where `start < end` already held
    /// when they were written.
    pub(crate) fn unchecked(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap: ranges that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeRange { start, end })
    }

    /// The parts of `self` not covered by any of `holes`, in order.
    pub fn subtract(&self, holes: &[TimeRange]) -> Vec<TimeRange> {
        let mut holes: Vec<&TimeRange> = holes.iter().filter(|h| h.overlaps(self)).collect();
        holes.sort_by_key(|h| h.start);

        let mut pieces = Vec::new();
        let mut cursor = self.start;
        for hole in holes {
            if hole.start > cursor {
                pieces.push(TimeRange {
                    start: cursor,
                    end: hole.start,
                });
            }
            cursor = cursor.max(hole.end);
            if cursor >= self.end {
                return pieces;
            }
        }
        if cursor < self.end {
            pieces.push(TimeRange {
                start: cursor,
                end: self.end,
            });
        }
        pieces
    }
}

/// Open windows: every slot clipped to `bounds`, minus `busy` time.
///
/// Windows from different slots are never merged, even when adjacent.
pub fn free_windows(slots: &[TimeRange], busy: &[TimeRange], bounds: &TimeRange) -> Vec<TimeRange> {
    let mut windows: Vec<TimeRange> = slots
        .iter()
        .filter_map(|slot| slot.intersect(bounds))
        .flat_map(|clipped| clipped.subtract(busy))
        .collect();
    windows.sort_by_key(|w| w.start);
    windows
}

/// A recurring weekly availability pattern, interpreted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyWindow {
    weekday: Weekday,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl WeeklyWindow {
    pub fn new(weekday: Weekday, start_time: NaiveTime, end_time: NaiveTime) -> CoachdeskResult<Self> {
        if start_time >= end_time {
            return Err(CoachdeskError::validation(format!(
                "weekly window on {weekday} must end after it starts"
            )));
        }
        Ok(Self {
            weekday,
            start_time,
            end_time,
        })
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Concrete ranges for `weeks` consecutive weeks, starting with the
    /// first matching weekday on or after `from`.
    pub fn occurrences(&self, from: NaiveDate, weeks: u32) -> Vec<TimeRange> {
        let first = next_on_or_after(from, self.weekday);
        (0..weeks)
            .map(|week| {
                let day = first + Duration::days(7 * i64::from(week));
                TimeRange {
                    start: day.and_time(self.start_time).and_utc(),
                    end: day.and_time(self.end_time).and_utc(),
                }
            })
            .collect()
    }
}

/// The first date on or after `date` that falls on `weekday`.
pub fn next_on_or_after(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let today = date.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let delta = (7 + target - today) % 7;
    date + Duration::days(i64::from(delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 7, h, m, 0).unwrap()
    }

    fn range(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeRange {
        TimeRange::new(at(h1, m1), at(h2, m2)).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(TimeRange::new(at(9, 0), at(9, 0)).is_err());
        assert!(TimeRange::new(at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = range(9, 0, 9, 30);
        let b = range(9, 30, 10, 0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&range(9, 15, 9, 45)));
    }

    #[test]
    fn containment_is_inclusive_at_edges() {
        let slot = range(9, 0, 10, 0);
        assert!(slot.contains(&range(9, 0, 10, 0)));
        assert!(slot.contains(&range(9, 0, 9, 30)));
        assert!(!slot.contains(&range(8, 59, 9, 30)));
        assert!(!slot.contains(&range(9, 30, 10, 1)));
    }

    #[test]
    fn subtract_splits_around_holes() {
        let slot = range(9, 0, 12, 0);
        let holes = [range(10, 0, 10, 30), range(9, 0, 9, 15), range(11, 30, 13, 0)];
        assert_eq!(
            slot.subtract(&holes),
            vec![range(9, 15, 10, 0), range(10, 30, 11, 30)]
        );
    }

    #[test]
    fn subtract_handles_overlapping_holes() {
        let slot = range(9, 0, 10, 0);
        let holes = [range(9, 10, 9, 40), range(9, 20, 9, 30)];
        assert_eq!(
            slot.subtract(&holes),
            vec![range(9, 0, 9, 10), range(9, 40, 10, 0)]
        );
    }

    #[test]
    fn fully_covered_slot_has_no_windows() {
        let slot = range(9, 0, 10, 0);
        assert!(slot.subtract(&[range(8, 0, 11, 0)]).is_empty());
    }

    #[test]
    fn free_windows_clip_to_bounds() {
        let slots = [range(9, 0, 10, 0), range(14, 0, 16, 0)];
        let busy = [range(9, 0, 9, 30)];
        let bounds = range(9, 15, 15, 0);
        assert_eq!(
            free_windows(&slots, &busy, &bounds),
            vec![range(9, 30, 10, 0), range(14, 0, 15, 0)]
        );
    }

    #[test]
    fn next_weekday_wraps_the_week() {
        // 2030-01-07 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        assert_eq!(next_on_or_after(monday, Weekday::Mon), monday);
        assert_eq!(
            next_on_or_after(monday, Weekday::Sat),
            NaiveDate::from_ymd_opt(2030, 1, 12).unwrap()
        );
        let friday = NaiveDate::from_ymd_opt(2030, 1, 11).unwrap();
        assert_eq!(
            next_on_or_after(friday, Weekday::Wed),
            NaiveDate::from_ymd_opt(2030, 1, 16).unwrap()
        );
    }

    #[test]
    fn weekly_window_expands_each_week() {
        let window = WeeklyWindow::new(
            Weekday::Wed,
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .unwrap();
        let from = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let ranges = window.occurrences(from, 3);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].start(), Utc.with_ymd_and_hms(2030, 1, 9, 16, 0, 0).unwrap());
        assert_eq!(ranges[2].end(), Utc.with_ymd_and_hms(2030, 1, 23, 17, 0, 0).unwrap());
    }

    #[test]
    fn weekly_window_rejects_inverted_times() {
        let result = WeeklyWindow::new(
            Weekday::Fri,
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        assert!(result.is_err());
    }
}
