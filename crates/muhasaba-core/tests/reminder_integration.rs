//! Integration tests for the Fajr reminder.
//!
//! Covers the full path from anchor lookup (mocked HTTP) to the polled
//! scheduler firing through a notifier, across a day rollover.

use std::sync::Arc;

use chrono::Duration;
use muhasaba_core::reminder::POLL_INTERVAL;
use muhasaba_core::{
    AladhanClient, AnchorError, AnchorTime, Coordinates, Event, FixedClock, NotificationPermission,
    Notifier, ReminderScheduler, ReminderService, ReminderSettings, ReminderState, StaticLocator,
};
use muhasaba_core::{Database, DeadlineGate, Tracker};

#[derive(Default)]
struct Inbox {
    permission: Option<NotificationPermission>,
    messages: Vec<(String, String)>,
    vibrations: usize,
}

impl Notifier for Inbox {
    fn permission(&self) -> NotificationPermission {
        self.permission.unwrap_or(NotificationPermission::Granted)
    }

    fn request_permission(&mut self) -> NotificationPermission {
        self.permission()
    }

    fn notify(&mut self, title: &str, body: &str) {
        self.messages.push((title.to_string(), body.to_string()));
    }

    fn vibrate(&mut self, _pattern_ms: &[u64]) {
        self.vibrations += 1;
    }
}

const MAKKAH: Coordinates = Coordinates {
    latitude: 21.42,
    longitude: 39.83,
};

async fn run_for(clock: &FixedClock, seconds: i64) {
    for _ in 0..seconds {
        clock.advance(Duration::seconds(1));
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[test]
fn test_scheduler_fires_once_per_day() {
    let clock = FixedClock::at(2026, 3, 7, 4, 59, 0).unwrap();
    let mut scheduler = ReminderScheduler::new(ReminderSettings::new(true, 30).unwrap());
    let mut inbox = Inbox::default();
    scheduler.set_anchor(AnchorTime::new(5, 30).unwrap(), clock_now(&clock));

    let mut fired = 0;
    // 04:59 through 05:01 on two consecutive days.
    for _day in 0..2 {
        for _ in 0..180 {
            if scheduler.tick(clock_now(&clock), &mut inbox).is_some() {
                fired += 1;
            }
            clock.advance(Duration::seconds(1));
        }
        clock.advance(Duration::seconds(24 * 3600 - 180));
    }

    assert_eq!(fired, 2);
    assert_eq!(inbox.messages.len(), 2);
    assert_eq!(inbox.messages[0].0, "Fajr prayer reminder");
    assert_eq!(inbox.messages[0].1, "30 minutes left until Fajr prayer.");
}

#[test]
fn test_denied_permission_still_vibrates() {
    let clock = FixedClock::at(2026, 3, 7, 5, 0, 0).unwrap();
    let mut scheduler = ReminderScheduler::new(ReminderSettings::new(true, 0).unwrap());
    let mut inbox = Inbox {
        permission: Some(NotificationPermission::Denied),
        ..Inbox::default()
    };
    scheduler.set_anchor(AnchorTime::new(5, 0).unwrap(), clock_now(&clock));

    let event = scheduler.tick(clock_now(&clock), &mut inbox);
    let Some(Event::ReminderFired {
        notified,
        permission,
        ..
    }) = event
    else {
        panic!("expected a firing at the anchor minute");
    };
    assert!(!notified);
    assert_eq!(permission, NotificationPermission::Denied);
    assert!(inbox.messages.is_empty());
    assert_eq!(inbox.vibrations, 1);
    assert_eq!(scheduler.state(), ReminderState::Fired);
}

#[tokio::test]
async fn test_service_acquires_anchor_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/timings/07-03-2026")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":200,"data":{"timings":{"Fajr":"05:10 (+03)"}}}"#)
        .create_async()
        .await;

    let clock = Arc::new(FixedClock::at(2026, 3, 7, 3, 0, 0).unwrap());
    let (mut service, _events) = ReminderService::new(
        ReminderScheduler::new(ReminderSettings::new(true, 30).unwrap()),
        Inbox::default(),
        clock,
        POLL_INTERVAL,
    );

    let client = AladhanClient::new(server.url(), 4);
    let acquired = service
        .acquire_anchor(&StaticLocator::new(Some(MAKKAH)), &client)
        .await;
    mock.assert_async().await;
    assert!(matches!(acquired, Event::AnchorAcquired { .. }));
    assert!(service.is_running());
    let status = service.status();
    assert_eq!(status.state, ReminderState::Armed);
    assert_eq!(status.anchor, AnchorTime::new(5, 10));
    assert_eq!(status.target.map(|t| t.to_string()), Some("04:40:00".to_string()));
}

#[tokio::test]
async fn test_acquire_again_after_a_failed_lookup() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/timings/07-03-2026")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"code":200,"data":{"timings":{"Fajr":"05:12"}}}"#)
        .create_async()
        .await;

    let clock = Arc::new(FixedClock::at(2026, 3, 7, 3, 0, 0).unwrap());
    let (mut service, _events) = ReminderService::new(
        ReminderScheduler::new(ReminderSettings::new(true, 30).unwrap()),
        Inbox::default(),
        clock,
        POLL_INTERVAL,
    );
    let client = AladhanClient::new(server.url(), 4);

    let failed = service
        .acquire_anchor(&StaticLocator::default(), &client)
        .await;
    assert!(matches!(failed, Event::AnchorFailed { .. }));
    assert!(!service.is_running());

    let retried = service
        .acquire_anchor(&StaticLocator::new(Some(MAKKAH)), &client)
        .await;
    mock.assert_async().await;
    assert!(matches!(retried, Event::AnchorAcquired { .. }));
    assert!(service.is_running());
    assert_eq!(service.status().anchor, AnchorTime::new(5, 12));
}

#[tokio::test(start_paused = true)]
async fn test_service_fires_through_the_timer() {
    let clock = Arc::new(FixedClock::at(2026, 3, 7, 4, 39, 30).unwrap());
    let (mut service, mut events) = ReminderService::new(
        ReminderScheduler::new(ReminderSettings::new(true, 30).unwrap()),
        Inbox::default(),
        clock.clone(),
        POLL_INTERVAL,
    );
    service.apply_anchor(AnchorTime::parse("05:10"));
    assert!(service.is_running());

    run_for(&clock, 90).await;

    let fired = events.try_recv().unwrap();
    assert!(matches!(fired, Event::ReminderFired { minutes_before: 30, .. }));
    assert!(events.try_recv().is_err());
    assert_eq!(service.notifier().lock().unwrap().messages.len(), 1);
    assert_eq!(service.status().state, ReminderState::Fired);
}

#[tokio::test(start_paused = true)]
async fn test_service_reports_missing_location() {
    let clock = Arc::new(FixedClock::at(2026, 3, 7, 3, 0, 0).unwrap());
    let (mut service, _events) = ReminderService::new(
        ReminderScheduler::new(ReminderSettings::new(true, 30).unwrap()),
        Inbox::default(),
        clock,
        POLL_INTERVAL,
    );

    let client = AladhanClient::new("http://127.0.0.1:9", 4);
    let event = service
        .acquire_anchor(&StaticLocator::default(), &client)
        .await;
    let Event::AnchorFailed { reason, .. } = event else {
        panic!("expected a failure event");
    };
    assert_eq!(reason, AnchorError::CapabilityUnavailable.user_message());
    assert!(!service.is_running());
    assert_eq!(service.status().state, ReminderState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_disable_from_another_handle_stops_the_watch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("muhasaba.db");
    let clock = Arc::new(FixedClock::at(2026, 3, 7, 4, 29, 50).unwrap());
    let gate = DeadlineGate::new(7, 2026);

    let mut writer = Tracker::load(Database::open_at(&path).unwrap(), clock.clone(), gate).unwrap();
    let enabled = ReminderSettings::new(true, 30).unwrap();
    writer.update_reminder_settings(enabled).unwrap();

    let watcher = Tracker::load(Database::open_at(&path).unwrap(), clock.clone(), gate).unwrap();
    let (service, mut events) = ReminderService::new(
        ReminderScheduler::new(watcher.reminder_settings()),
        Inbox::default(),
        clock.clone(),
        POLL_INTERVAL,
    );
    let mut service = service.with_settings_source(watcher);
    service.apply_anchor(AnchorTime::parse("05:00"));

    run_for(&clock, 9).await;
    writer.update_reminder_settings(enabled.with_enabled(false)).unwrap();
    run_for(&clock, 60).await;

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, Event::ReminderFired { .. }), "fired after disable");
    }
    assert!(service.notifier().lock().unwrap().messages.is_empty());
    assert!(!service.status().settings.enabled);
}

fn clock_now(clock: &FixedClock) -> chrono::NaiveDateTime {
    use muhasaba_core::Clock;
    clock.now()
}
