//! Integration tests for the tracker workflow.
//!
//! A single fixed clock drives a Saturday-morning lesson, the prayers of the
//! day and the season close, against both the in-memory and SQLite stores.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use muhasaba_core::stats;
use muhasaba_core::{
    BlobStore, Database, DeadlineGate, Event, FixedClock, GoalCategory, MemoryStore, PrayerSlot,
    Presence, SessionName, Tracker,
};

fn saturday_fajr() -> Arc<FixedClock> {
    // 2026-03-07 is a Saturday.
    Arc::new(FixedClock::at(2026, 3, 7, 5, 0, 0).unwrap())
}

#[test]
fn test_saturday_morning_scenario() {
    let clock = saturday_fajr();
    let mut tracker =
        Tracker::load(MemoryStore::new(), clock.clone(), DeadlineGate::default()).unwrap();

    assert_eq!(tracker.available_sessions(), vec![SessionName::SaturdayFajr]);

    let event = tracker
        .register_attendance(Presence::Present, SessionName::SaturdayFajr)
        .unwrap();
    assert!(matches!(event, Some(Event::AttendanceRegistered { .. })));
    assert_eq!(tracker.score(), 5);

    tracker
        .set_prayer_status(PrayerSlot::Fajr, Some(Presence::Present))
        .unwrap();
    assert_eq!(tracker.score(), 10);

    // Second registration for the same lesson and day is ignored.
    let again = tracker
        .register_attendance(Presence::Absent, SessionName::SaturdayFajr)
        .unwrap();
    assert!(again.is_none());
    assert_eq!(tracker.attendance().len(), 1);
    assert_eq!(tracker.attendance()[0].status, Presence::Present);
    assert_eq!(tracker.attendance()[0].display_date, "7/3/2026");
    assert!(tracker.available_sessions().is_empty());
    assert_eq!(tracker.score(), 10);
}

#[test]
fn test_session_windows_follow_the_clock() {
    let clock = saturday_fajr();
    let mut tracker =
        Tracker::load(MemoryStore::new(), clock.clone(), DeadlineGate::default()).unwrap();

    // Afternoon: the Asr lesson opens, Fajr is closed.
    clock.set(clock_at(2026, 3, 7, 16));
    assert_eq!(tracker.open_sessions(), vec![SessionName::SaturdayAsr]);
    assert!(tracker
        .register_attendance(Presence::Present, SessionName::SaturdayFajr)
        .unwrap()
        .is_none());

    // Wednesday evening: only the Maghrib lesson.
    clock.set(clock_at(2026, 3, 11, 19));
    assert!(tracker
        .register_attendance(Presence::Absent, SessionName::WednesdayMaghrib)
        .unwrap()
        .is_some());
    // Absent entries cost nothing and earn nothing.
    assert_eq!(tracker.score(), 0);
    assert_eq!(stats::attendance_totals(tracker.attendance()).absent, 1);
}

#[test]
fn test_season_close_freezes_point_earning() {
    let clock = saturday_fajr();
    let mut tracker =
        Tracker::load(MemoryStore::new(), clock.clone(), DeadlineGate::new(3, 2026)).unwrap();
    tracker.increment_tally().unwrap();
    tracker
        .set_prayer_status(PrayerSlot::Isha, Some(Presence::Present))
        .unwrap();
    let goal = tracker.add_goal("Memorise Al-Mulk", GoalCategory::Worship).unwrap();
    let Some(Event::GoalAdded { id, .. }) = goal else {
        panic!("goal should be added while the season is open");
    };

    // 2026-04-04 is a Saturday, but the season closed after March.
    clock.set(clock_at(2026, 4, 4, 5));
    assert!(tracker.is_past_deadline());
    assert!(tracker.available_sessions().is_empty());
    assert!(tracker.increment_tally().unwrap().is_none());
    assert!(tracker.reset_tally().unwrap().is_none());
    assert!(tracker
        .set_prayer_status(PrayerSlot::Fajr, Some(Presence::Present))
        .unwrap()
        .is_none());
    assert!(tracker.add_goal("Late goal", GoalCategory::General).unwrap().is_none());
    assert_eq!(tracker.tally(), 1);
    assert_eq!(tracker.score(), 5);

    // Goal completion stays editable after the close.
    assert!(tracker.toggle_goal(&id).unwrap().is_some());
    assert!(tracker.goals()[0].completed);
}

#[test]
fn test_state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("muhasaba.db");
    let clock = saturday_fajr();

    {
        let db = Database::open_at(&path).unwrap();
        let mut tracker = Tracker::load(db, clock.clone(), DeadlineGate::default()).unwrap();
        tracker
            .register_attendance(Presence::Present, SessionName::SaturdayFajr)
            .unwrap();
        tracker
            .set_prayer_status(PrayerSlot::Fajr, Some(Presence::Present))
            .unwrap();
        for _ in 0..33 {
            tracker.increment_tally().unwrap();
        }
        tracker.add_goal("Read tafsir daily", GoalCategory::Knowledge).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    assert!(db.has("attendance").unwrap());
    let tracker = Tracker::load(db, clock, DeadlineGate::default()).unwrap();
    assert_eq!(tracker.tally(), 33);
    assert_eq!(tracker.attendance().len(), 1);
    assert_eq!(tracker.today_prayers().fajr, Some(Presence::Present));
    assert_eq!(tracker.goals()[0].category, GoalCategory::Knowledge);
    assert_eq!(tracker.score(), 10);
}

#[test]
fn test_prayer_week_reports_oldest_first() {
    let clock = saturday_fajr();
    let mut tracker =
        Tracker::load(MemoryStore::new(), clock.clone(), DeadlineGate::default()).unwrap();

    for day in 0..3 {
        if day > 0 {
            clock.advance(Duration::days(1));
        }
        for slot in PrayerSlot::ALL {
            tracker
                .set_prayer_status(slot, Some(Presence::Present))
                .unwrap();
        }
    }

    let today = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let week = stats::prayer_week(tracker.prayer_history(), today);
    assert_eq!(week.len(), 7);
    assert_eq!(week[6].label, "9/3");
    let values: Vec<u32> = week.iter().map(|d| d.value).collect();
    assert_eq!(values, vec![0, 0, 0, 0, 3, 3, 3]);
    assert_eq!(tracker.score_breakdown().prayer_points, 45);
}

fn clock_at(year: i32, month: u32, day: u32, hour: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}
