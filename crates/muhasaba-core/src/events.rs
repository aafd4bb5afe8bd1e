use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::clock::DayKey;
use crate::records::{GoalCategory, Presence, PrayerSlot, ReminderSettings};
use crate::reminder::{NotificationPermission, ReminderState};
use crate::sessions::SessionName;

/// Every state change in the system produces an Event.
/// Policy no-ops produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AttendanceRegistered {
        day_key: DayKey,
        lesson: SessionName,
        status: Presence,
        at: NaiveDateTime,
    },
    PrayerStatusSet {
        day_key: DayKey,
        slot: PrayerSlot,
        status: Option<Presence>,
        at: NaiveDateTime,
    },
    TallyIncremented {
        count: u64,
        at: NaiveDateTime,
    },
    TallyReset {
        at: NaiveDateTime,
    },
    GoalAdded {
        id: String,
        category: GoalCategory,
        at: NaiveDateTime,
    },
    GoalToggled {
        id: String,
        completed: bool,
        at: NaiveDateTime,
    },
    GoalDeleted {
        id: String,
        at: NaiveDateTime,
    },
    ReminderSettingsChanged {
        settings: ReminderSettings,
        at: NaiveDateTime,
    },
    /// Scheduler moved between Idle, Armed and Fired.
    ReminderStateChanged {
        from: ReminderState,
        to: ReminderState,
        at: NaiveDateTime,
    },
    ReminderFired {
        target: NaiveTime,
        minutes_before: u32,
        /// Permission after any request made while firing.
        permission: NotificationPermission,
        notified: bool,
        at: NaiveDateTime,
    },
    AnchorAcquired {
        anchor: NaiveTime,
        at: NaiveDateTime,
    },
    AnchorFailed {
        reason: String,
        at: NaiveDateTime,
    },
}
