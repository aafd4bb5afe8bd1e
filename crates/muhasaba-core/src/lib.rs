//! # Muhasaba Core Library
//!
//! Business logic for Muhasaba, a local-first tracker for lesson attendance,
//! daily prayers, a tasbeeh counter and personal goals. The CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Clock**: every component reads time through an injected [`Clock`], so
//!   a single operation sees one instant and tests can pin the date
//! - **Season gate**: [`DeadlineGate`] freezes point-earning activity after
//!   the season closes
//! - **Sessions**: fixed weekly windows during which attendance is accepted
//! - **Tracker**: the event store, persisted as whole JSON blobs in a
//!   [`BlobStore`]
//! - **Score / Stats**: pure derivations over tracker snapshots
//! - **Reminder**: a wall-clock state machine polled once per second that
//!   fires a single notification before Fajr each day
//!
//! ## Key Components
//!
//! - [`Tracker`]: gated mutations over attendance, prayers, tally and goals
//! - [`ReminderScheduler`] / [`ReminderService`]: reminder firing and its timer
//! - [`Database`]: SQLite blob store
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod records;
pub mod reminder;
pub mod score;
pub mod season;
pub mod sessions;
pub mod stats;
pub mod storage;
pub mod tracker;

pub use clock::{Clock, DayKey, FixedClock, SystemClock};
pub use error::{AnchorError, ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use records::{
    AttendanceEntry, Goal, GoalCategory, PrayerDay, PrayerHistory, PrayerSlot, Presence,
    ReminderSettings,
};
pub use reminder::{
    AladhanClient, AnchorTime, Coordinates, NotificationPermission, Notifier, ReminderScheduler,
    ReminderService, ReminderState, ReminderStatus, SettingsSource, StaticLocator,
};
pub use score::{compute_score, ScoreBreakdown, MAX_SCORE};
pub use season::DeadlineGate;
pub use sessions::{open_sessions, SessionName};
pub use storage::{BlobStore, Config, Database, MemoryStore};
pub use tracker::Tracker;
