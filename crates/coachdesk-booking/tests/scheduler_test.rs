//! Integration tests for availability and booking against in-memory
//! SurrealDB.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use coachdesk_booking::{
    AvailabilityStore, BookingError, BookingScheduler, ScheduleLocks, ManualClock, SchedulingConfig,
};
use coachdesk_core::models::booking::{Booking, BookingStatus};
use coachdesk_core::repository::Pagination;
use coachdesk_core::schedule::{TimeRange, WeeklyWindow};
use coachdesk_db::repository::{SurrealAvailabilityRepository, SurrealBookingRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Store = AvailabilityStore<SurrealAvailabilityRepository<Db>, SurrealBookingRepository<Db>>;
type Scheduler = BookingScheduler<SurrealAvailabilityRepository<Db>, SurrealBookingRepository<Db>>;

/// 2030-01-07 is a Monday.
fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, hour, minute, 0).unwrap()
}

/// Spin up in-memory DB with the clock at 08:00 on the test day.
async fn setup() -> (Store, Scheduler, Arc<ManualClock>) {
    setup_with(SchedulingConfig::default()).await
}

async fn setup_with(config: SchedulingConfig) -> (Store, Scheduler, Arc<ManualClock>) {
    let db = memory_db().await;
    let clock = Arc::new(ManualClock::new(at(8, 0)));
    let locks = ScheduleLocks::new();
    let store = AvailabilityStore::new(
        SurrealAvailabilityRepository::new(db.clone()),
        SurrealBookingRepository::new(db.clone()),
        locks.clone(),
    );
    let scheduler = scheduler_on(&db, locks, config, clock.clone());

    (store, scheduler, clock)
}

async fn memory_db() -> Surreal<Db> {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    coachdesk_db::apply_schema(&db).await.unwrap();
    db
}

fn scheduler_on(
    db: &Surreal<Db>,
    locks: ScheduleLocks,
    config: SchedulingConfig,
    clock: Arc<ManualClock>,
) -> Scheduler {
    BookingScheduler::new(
        SurrealAvailabilityRepository::new(db.clone()),
        SurrealBookingRepository::new(db.clone()),
        locks,
        config,
    )
    .with_clock(clock)
}

#[tokio::test]
async fn cancel_frees_the_time_for_another_learner() {
    let (store, scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();

    let booked = scheduler
        .book(first, coach, at(9, 0), at(9, 30))
        .await
        .unwrap();
    assert_eq!(booked.status, BookingStatus::Scheduled);

    let err = scheduler
        .book(second, coach, at(9, 15), at(9, 45))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Overlap));

    let cancelled = scheduler.cancel(booked.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let retried = scheduler
        .book(second, coach, at(9, 15), at(9, 45))
        .await
        .unwrap();
    assert_eq!(retried.learner_id, second);
}

#[tokio::test]
async fn past_start_is_rejected_for_any_input() {
    let (store, scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    store.add_slot(coach, at(6, 0), at(12, 0)).await.unwrap();

    for (start, end) in [
        (at(7, 0), at(7, 30)),
        (at(8, 0), at(9, 0)),
        (at(7, 30), at(7, 0)),
        (at(6, 0), at(6, 0)),
    ] {
        let err = scheduler
            .book(Uuid::new_v4(), coach, start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::PastTime), "{start}..{end}");
    }
}

#[tokio::test]
async fn booking_must_fit_inside_one_slot() {
    let (store, scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();
    store.add_slot(coach, at(10, 0), at(11, 0)).await.unwrap();

    let err = scheduler
        .book(Uuid::new_v4(), coach, at(9, 30), at(10, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    let err = scheduler
        .book(Uuid::new_v4(), coach, at(12, 0), at(13, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    let err = scheduler
        .book(Uuid::new_v4(), coach, at(9, 30), at(9, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRange(_)));
}

#[tokio::test]
async fn learner_cannot_be_in_two_places() {
    let (store, scheduler, _clock) = setup().await;
    let (coach_a, coach_b, learner) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    store.add_slot(coach_a, at(9, 0), at(10, 0)).await.unwrap();
    store.add_slot(coach_b, at(9, 0), at(10, 0)).await.unwrap();

    scheduler
        .book(learner, coach_a, at(9, 0), at(9, 30))
        .await
        .unwrap();
    let err = scheduler
        .book(learner, coach_b, at(9, 15), at(9, 45))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::LearnerOverlap));

    // Back to back is fine.
    scheduler
        .book(learner, coach_b, at(9, 30), at(10, 0))
        .await
        .unwrap();
}

/// Book every `(learner, coach, start, end)` request on its own task and
/// return the results in request order.
async fn book_in_parallel(
    scheduler: &Arc<Scheduler>,
    requests: Vec<(Uuid, Uuid, DateTime<Utc>, DateTime<Utc>)>,
) -> Vec<Result<Booking, BookingError>> {
    let tasks: Vec<_> = requests
        .into_iter()
        .map(|(learner, coach, start, end)| {
            let scheduler = Arc::clone(scheduler);
            tokio::spawn(async move { scheduler.book(learner, coach, start, end).await })
        })
        .collect();
    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overlapping_bookings_have_one_winner() {
    let (store, scheduler, _clock) = setup().await;
    let scheduler = Arc::new(scheduler);

    for _ in 0..10 {
        let coach = Uuid::new_v4();
        store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();

        let requests = (0..8)
            .map(|i| (Uuid::new_v4(), coach, at(9, i), at(9, 30 + i)))
            .collect();
        let results = book_in_parallel(&scheduler, requests).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for loser in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(loser, Err(BookingError::Overlap)));
        }
        let live = scheduler
            .schedule_for_coach(coach, at(0, 0), at(23, 0))
            .await
            .unwrap();
        assert_eq!(live.len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn learner_cannot_be_booked_with_two_coaches_at_once() {
    let (store, scheduler, _clock) = setup().await;
    let scheduler = Arc::new(scheduler);

    for _ in 0..10 {
        let learner = Uuid::new_v4();
        let mut requests = Vec::new();
        for _ in 0..8 {
            let coach = Uuid::new_v4();
            store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();
            requests.push((learner, coach, at(9, 0), at(9, 30)));
        }

        let results = book_in_parallel(&scheduler, requests).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for loser in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(loser, Err(BookingError::LearnerOverlap)));
        }
        let upcoming = scheduler.upcoming_for_learner(learner).await.unwrap();
        assert_eq!(upcoming.len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn schedulers_with_separate_locks_still_never_double_book() {
    let db = memory_db().await;
    let clock = Arc::new(ManualClock::new(at(8, 0)));
    let store = AvailabilityStore::new(
        SurrealAvailabilityRepository::new(db.clone()),
        SurrealBookingRepository::new(db.clone()),
        ScheduleLocks::new(),
    );
    // Two schedulers that do not share a lock table, as two processes
    // writing to one database would.
    let schedulers = [
        Arc::new(scheduler_on(&db, ScheduleLocks::new(), SchedulingConfig::default(), clock.clone())),
        Arc::new(scheduler_on(&db, ScheduleLocks::new(), SchedulingConfig::default(), clock)),
    ];

    for _ in 0..10 {
        let coach = Uuid::new_v4();
        store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let scheduler = Arc::clone(&schedulers[i as usize % 2]);
                tokio::spawn(async move {
                    scheduler
                        .book(Uuid::new_v4(), coach, at(9, i), at(9, 30 + i))
                        .await
                })
            })
            .collect();
        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, BookingError::Overlap)),
            }
        }
        assert_eq!(created, 1);

        let live = schedulers[0]
            .schedule_for_coach(coach, at(0, 0), at(23, 0))
            .await
            .unwrap();
        assert_eq!(live.len(), 1);
    }
}

#[tokio::test]
async fn cancellation_rules() {
    let config = SchedulingConfig {
        cancellation_notice_secs: 3600,
        ..Default::default()
    };
    let (store, scheduler, clock) = setup_with(config).await;
    let coach = Uuid::new_v4();
    store.add_slot(coach, at(9, 0), at(12, 0)).await.unwrap();

    let early = scheduler
        .book(Uuid::new_v4(), coach, at(9, 0), at(10, 0))
        .await
        .unwrap();
    let late = scheduler
        .book(Uuid::new_v4(), coach, at(11, 0), at(12, 0))
        .await
        .unwrap();

    // 08:30 is within the hour of notice for 09:00.
    clock.set(at(8, 30));
    let err = scheduler.cancel(early.id).await.unwrap_err();
    assert!(matches!(err, BookingError::TooLateToCancel));

    scheduler.cancel(late.id).await.unwrap();
    let err = scheduler.cancel(late.id).await.unwrap_err();
    assert!(matches!(
        err,
        BookingError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Cancelled
        }
    ));
}

#[tokio::test]
async fn query_returns_unbooked_windows() {
    let (store, scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    store.add_slot(coach, at(9, 0), at(12, 0)).await.unwrap();
    store.add_slot(coach, at(12, 0), at(13, 0)).await.unwrap();

    scheduler
        .book(Uuid::new_v4(), coach, at(10, 0), at(11, 0))
        .await
        .unwrap();
    let cancelled = scheduler
        .book(Uuid::new_v4(), coach, at(11, 0), at(11, 30))
        .await
        .unwrap();
    scheduler.cancel(cancelled.id).await.unwrap();

    let windows = store.query(coach, at(9, 30), at(23, 0)).await.unwrap();
    let expected = [
        TimeRange::new(at(9, 30), at(10, 0)).unwrap(),
        TimeRange::new(at(11, 0), at(12, 0)).unwrap(),
        TimeRange::new(at(12, 0), at(13, 0)).unwrap(),
    ];
    assert_eq!(windows, expected);
}

#[tokio::test]
async fn overlapping_slots_are_rejected() {
    let (store, _scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();

    let err = store.add_slot(coach, at(9, 30), at(10, 30)).await.unwrap_err();
    assert!(matches!(err, BookingError::SlotOverlap));
    let err = store.add_slot(coach, at(11, 0), at(10, 0)).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidRange(_)));
}

#[tokio::test]
async fn booked_slot_cannot_be_removed() {
    let (store, scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    let slot = store.add_slot(coach, at(9, 0), at(10, 0)).await.unwrap();
    let booking = scheduler
        .book(Uuid::new_v4(), coach, at(9, 0), at(9, 30))
        .await
        .unwrap();

    let err = store.remove_slot(slot.id).await.unwrap_err();
    assert!(matches!(err, BookingError::SlotInUse));

    scheduler.cancel(booking.id).await.unwrap();
    store.remove_slot(slot.id).await.unwrap();
    assert!(store.slots(coach, at(0, 0), at(23, 0)).await.unwrap().is_empty());

    let err = store.remove_slot(slot.id).await.unwrap_err();
    assert!(matches!(err, BookingError::Store(_)));
}

#[tokio::test]
async fn weekly_expansion_is_idempotent() {
    let (store, _scheduler, _clock) = setup().await;
    let coach = Uuid::new_v4();
    let windows = [
        WeeklyWindow::new(
            Weekday::Tue,
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .unwrap(),
        WeeklyWindow::new(
            Weekday::Thu,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        )
        .unwrap(),
    ];
    let from = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();

    let created = store.add_weekly(coach, &windows, from, 3).await.unwrap();
    assert_eq!(created.len(), 6);
    assert_eq!(created[0].start, Utc.with_ymd_and_hms(2030, 1, 8, 16, 0, 0).unwrap());
    assert!(created.windows(2).all(|w| w[0].start < w[1].start));

    let again = store.add_weekly(coach, &windows, from, 3).await.unwrap();
    assert!(again.is_empty());

    let all = store
        .slots(coach, at(0, 0), at(0, 0) + Duration::weeks(4))
        .await
        .unwrap();
    assert_eq!(all.len(), 6);
}

#[tokio::test]
async fn learner_views() {
    let (store, scheduler, clock) = setup().await;
    let (coach, learner) = (Uuid::new_v4(), Uuid::new_v4());
    store.add_slot(coach, at(9, 0), at(12, 0)).await.unwrap();

    let first = scheduler.book(learner, coach, at(9, 0), at(10, 0)).await.unwrap();
    let second = scheduler.book(learner, coach, at(11, 0), at(12, 0)).await.unwrap();

    let upcoming = scheduler.upcoming_for_learner(learner).await.unwrap();
    assert_eq!(
        upcoming.iter().map(|b| b.id).collect::<Vec<_>>(),
        [first.id, second.id]
    );

    clock.set(at(10, 30));
    let upcoming = scheduler.upcoming_for_learner(learner).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, second.id);

    let history = scheduler
        .history_for_learner(learner, Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.total, 2);
    assert_eq!(history.items[0].id, second.id);
    assert_eq!(scheduler.get(first.id).await.unwrap().learner_id, learner);
}
