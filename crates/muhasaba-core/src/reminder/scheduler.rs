//! Fajr reminder state machine.
//!
//! The scheduler does not own a thread or a timer; the caller invokes
//! `tick()` at least once per second (see [`super::ReminderTimer`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle --(enabled + anchor)--> Armed --(tick at target minute)--> Fired
//!  ^                                                                |
//!  +------(disabled | anchor cleared | next calendar day)----------+
//! ```
//!
//! A fired marker keyed by `(date, target)` makes the emission happen once
//! per day for a given target, however often `tick()` runs during the
//! target minute.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::anchor::AnchorTime;
use super::notifier::{NotificationPermission, Notifier};
use crate::error::AnchorError;
use crate::events::Event;
use crate::records::ReminderSettings;

const DEFAULT_TITLE: &str = "Fajr prayer reminder";
const DEFAULT_VIBRATION_MS: [u64; 3] = [200, 100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderState {
    /// Disabled, or no anchor yet.
    Idle,
    /// Waiting for today's target minute.
    Armed,
    /// Today's reminder for the current target has been emitted.
    Fired,
}

/// Read-only view for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderStatus {
    pub state: ReminderState,
    pub settings: ReminderSettings,
    pub anchor: Option<AnchorTime>,
    pub target: Option<NaiveTime>,
    /// User-facing message for the last anchor failure.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    settings: ReminderSettings,
    anchor: Option<AnchorTime>,
    error: Option<AnchorError>,
    state: ReminderState,
    last_fired: Option<(NaiveDate, NaiveTime)>,
    title: String,
    vibration_ms: Vec<u64>,
}

impl ReminderScheduler {
    pub fn new(settings: ReminderSettings) -> Self {
        Self {
            settings: settings.clamped(),
            anchor: None,
            error: None,
            state: ReminderState::Idle,
            last_fired: None,
            title: DEFAULT_TITLE.to_string(),
            vibration_ms: DEFAULT_VIBRATION_MS.to_vec(),
        }
    }

    pub fn with_notification(mut self, title: impl Into<String>, vibration_ms: Vec<u64>) -> Self {
        self.title = title.into();
        self.vibration_ms = vibration_ms;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ReminderState {
        self.state
    }

    pub fn settings(&self) -> ReminderSettings {
        self.settings
    }

    pub fn anchor(&self) -> Option<AnchorTime> {
        self.anchor
    }

    pub fn error(&self) -> Option<&AnchorError> {
        self.error.as_ref()
    }

    /// Wall-clock minute at which the reminder fires.
    pub fn target_time(&self) -> Option<NaiveTime> {
        self.anchor
            .map(|a| a.minus_minutes(self.settings.minutes_before))
    }

    /// Enabled with an anchor; the polling timer only needs to run then.
    pub fn is_armable(&self) -> bool {
        self.settings.enabled && self.anchor.is_some()
    }

    pub fn status(&self) -> ReminderStatus {
        ReminderStatus {
            state: self.state,
            settings: self.settings,
            anchor: self.anchor,
            target: self.target_time(),
            error: self.error.as_ref().map(|e| e.user_message().to_string()),
        }
    }

    pub fn body(&self) -> String {
        format!(
            "{} minutes left until Fajr prayer.",
            self.settings.minutes_before
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn update_settings(&mut self, settings: ReminderSettings, now: NaiveDateTime) -> Option<Event> {
        self.settings = settings.clamped();
        self.transition(now)
    }

    pub fn set_anchor(&mut self, anchor: AnchorTime, now: NaiveDateTime) -> Option<Event> {
        info!(%anchor, "anchor time acquired");
        self.anchor = Some(anchor);
        self.error = None;
        self.transition(now)
    }

    /// Record an acquisition failure. The scheduler stays idle until an
    /// anchor is set.
    pub fn anchor_failed(&mut self, error: AnchorError, now: NaiveDateTime) -> Event {
        warn!(%error, "anchor time unavailable");
        let reason = error.user_message().to_string();
        self.anchor = None;
        self.error = Some(error);
        self.transition(now);
        Event::AnchorFailed { reason, at: now }
    }

    pub fn clear_anchor(&mut self, now: NaiveDateTime) -> Option<Event> {
        self.anchor = None;
        self.transition(now)
    }

    /// Poll once. Returns `ReminderFired` exactly when the reminder is
    /// emitted.
    pub fn tick(&mut self, now: NaiveDateTime, notifier: &mut impl Notifier) -> Option<Event> {
        // Also rolls Fired back to Armed on a new day.
        self.transition(now);
        if self.state != ReminderState::Armed || !self.settings.enabled {
            return None;
        }
        let target = self.target_time()?;
        if now.hour() != target.hour() || now.minute() != target.minute() {
            return None;
        }
        Some(self.fire(now, target, notifier))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn fire(&mut self, now: NaiveDateTime, target: NaiveTime, notifier: &mut impl Notifier) -> Event {
        let mut permission = notifier.permission();
        if permission == NotificationPermission::Default {
            permission = notifier.request_permission();
        }
        let notified = permission == NotificationPermission::Granted;
        if notified {
            notifier.notify(&self.title, &self.body());
        } else {
            debug!(?permission, "notification skipped");
        }
        notifier.vibrate(&self.vibration_ms);

        self.last_fired = Some((now.date(), target));
        self.state = ReminderState::Fired;
        info!(%target, notified, "fajr reminder fired");

        Event::ReminderFired {
            target,
            minutes_before: self.settings.minutes_before,
            permission,
            notified,
            at: now,
        }
    }

    fn resolve(&self, today: NaiveDate) -> ReminderState {
        match (self.settings.enabled, self.target_time()) {
            (true, Some(target)) if self.last_fired == Some((today, target)) => ReminderState::Fired,
            (true, Some(_)) => ReminderState::Armed,
            _ => ReminderState::Idle,
        }
    }

    fn transition(&mut self, now: NaiveDateTime) -> Option<Event> {
        let next = self.resolve(now.date());
        if next == self.state {
            return None;
        }
        let from = std::mem::replace(&mut self.state, next);
        debug!(?from, to = ?next, "reminder state changed");
        Some(Event::ReminderStateChanged {
            from,
            to: next,
            at: now,
        })
    }
}
