//! Fajr reminder: anchor acquisition, the firing state machine, and the
//! timer that polls it.

pub mod anchor;
mod notifier;
mod scheduler;
mod timer;

pub use anchor::{AladhanClient, AnchorTime, Coordinates, Locator, PrayerTimeService, StaticLocator};
pub use notifier::{NotificationPermission, Notifier};
pub use scheduler::{ReminderScheduler, ReminderState, ReminderStatus};
pub use timer::{ReminderService, ReminderTimer, SettingsSource, POLL_INTERVAL};
