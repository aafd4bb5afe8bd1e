//! Event store for attendance, prayers, tally and goals.
//!
//! The tracker exclusively owns every record. Each mutation reads the clock
//! once, consults the season gate, applies the change and rewrites that
//! category's blob in full. Policy rejections return `Ok(None)`.
//!
//! ```text
//! register_attendance ─┐
//! set_prayer_status   ─┤
//! increment/reset     ─┼─ gate open? ─ yes ─> mutate ─> persist blob ─> Some(Event)
//! add_goal            ─┘              └ no ─> Ok(None)
//!
//! toggle_goal / delete_goal / update_reminder_settings ─> not gated
//! ```

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{display_date, Clock, DayKey};
use crate::error::{Result, StorageError};
use crate::events::Event;
use crate::records::{
    AttendanceEntry, Goal, GoalCategory, PrayerDay, PrayerHistory, PrayerSlot, Presence,
    ReminderSettings,
};
use crate::score::{self, ScoreBreakdown};
use crate::season::DeadlineGate;
use crate::sessions::{self, SessionName};
use crate::reminder::SettingsSource;
use crate::storage::{keys, BlobStore};

pub struct Tracker<S: BlobStore> {
    store: S,
    clock: Arc<dyn Clock>,
    gate: DeadlineGate,
    tally: u64,
    attendance: Vec<AttendanceEntry>,
    prayers: PrayerHistory,
    goals: Vec<Goal>,
    reminders: ReminderSettings,
}

impl<S: BlobStore> Tracker<S> {
    /// Read all five blobs once. Missing blobs start empty.
    ///
    /// # Errors
    /// Fails if the store cannot be read or a blob does not decode.
    pub fn load(store: S, clock: Arc<dyn Clock>, gate: DeadlineGate) -> Result<Self> {
        let tally = read_blob(&store, keys::TALLY)?.unwrap_or(0);
        let attendance = read_blob(&store, keys::ATTENDANCE)?.unwrap_or_default();
        let prayers = read_blob(&store, keys::PRAYER_HISTORY)?.unwrap_or_default();
        let goals = read_blob(&store, keys::GOALS)?.unwrap_or_default();
        let reminders = read_blob::<ReminderSettings>(&store, keys::REMINDERS)?
            .unwrap_or_default()
            .clamped();
        Ok(Self {
            store,
            clock,
            gate,
            tally,
            attendance,
            prayers,
            goals,
            reminders,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn gate(&self) -> DeadlineGate {
        self.gate
    }

    pub fn is_past_deadline(&self) -> bool {
        self.gate.is_past_deadline(self.now())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tally(&self) -> u64 {
        self.tally
    }

    /// Newest first.
    pub fn attendance(&self) -> &[AttendanceEntry] {
        &self.attendance
    }

    pub fn prayer_history(&self) -> &PrayerHistory {
        &self.prayers
    }

    /// Newest first.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        self.reminders
    }

    pub fn today_key(&self) -> DayKey {
        DayKey::today(self.clock.as_ref())
    }

    pub fn today_prayers(&self) -> PrayerDay {
        self.prayers
            .get(&self.today_key())
            .copied()
            .unwrap_or_default()
    }

    pub fn open_sessions(&self) -> Vec<SessionName> {
        let now = self.now();
        sessions::open_sessions(now.weekday(), now.hour())
    }

    /// Open sessions not yet registered today.
    pub fn available_sessions(&self) -> Vec<SessionName> {
        let now = self.now();
        let today = DayKey::from_date(now.date());
        sessions::open_sessions(now.weekday(), now.hour())
            .into_iter()
            .filter(|s| !self.is_registered(&today, *s))
            .collect()
    }

    pub fn score(&self) -> u32 {
        score::compute_score(&self.attendance, &self.prayers)
    }

    pub fn score_breakdown(&self) -> ScoreBreakdown {
        ScoreBreakdown::compute(&self.attendance, &self.prayers)
    }

    fn is_registered(&self, day: &DayKey, session: SessionName) -> bool {
        self.attendance
            .iter()
            .any(|a| &a.day_key == day && a.lesson == session)
    }

    // ── Gated commands ───────────────────────────────────────────────

    /// Register attendance for a currently open session. First write wins.
    pub fn register_attendance(
        &mut self,
        status: Presence,
        session: SessionName,
    ) -> Result<Option<Event>> {
        let now = self.now();
        if self.gate.is_past_deadline(now) {
            debug!(%session, "attendance rejected: season closed");
            return Ok(None);
        }
        if !sessions::is_open(session, now.weekday(), now.hour()) {
            debug!(%session, "attendance rejected: session not open");
            return Ok(None);
        }
        let day_key = DayKey::from_date(now.date());
        if self.is_registered(&day_key, session) {
            debug!(%session, %day_key, "attendance rejected: already registered");
            return Ok(None);
        }

        let mut attendance = self.attendance.clone();
        attendance.insert(
            0,
            AttendanceEntry {
                day_key: day_key.clone(),
                display_date: display_date(now.date()),
                lesson: session,
                status,
            },
        );
        commit(&mut self.store, keys::ATTENDANCE, &mut self.attendance, attendance)?;
        Ok(Some(Event::AttendanceRegistered {
            day_key,
            lesson: session,
            status,
            at: now,
        }))
    }

    /// Overwrite one of today's prayer slots. `None` clears it.
    pub fn set_prayer_status(
        &mut self,
        slot: PrayerSlot,
        status: Option<Presence>,
    ) -> Result<Option<Event>> {
        let now = self.now();
        if self.gate.is_past_deadline(now) {
            debug!(%slot, "prayer update rejected: season closed");
            return Ok(None);
        }
        let day_key = DayKey::from_date(now.date());
        let mut prayers = self.prayers.clone();
        prayers.entry(day_key.clone()).or_default().set(slot, status);
        commit(&mut self.store, keys::PRAYER_HISTORY, &mut self.prayers, prayers)?;
        Ok(Some(Event::PrayerStatusSet {
            day_key,
            slot,
            status,
            at: now,
        }))
    }

    /// Set the slot to `status`, or clear it when it already holds `status`.
    pub fn toggle_prayer_status(
        &mut self,
        slot: PrayerSlot,
        status: Presence,
    ) -> Result<Option<Event>> {
        let next = match self.today_prayers().get(slot) {
            Some(current) if current == status => None,
            _ => Some(status),
        };
        self.set_prayer_status(slot, next)
    }

    pub fn increment_tally(&mut self) -> Result<Option<Event>> {
        let now = self.now();
        if self.gate.is_past_deadline(now) {
            debug!("tally increment rejected: season closed");
            return Ok(None);
        }
        let count = self.tally.saturating_add(1);
        commit(&mut self.store, keys::TALLY, &mut self.tally, count)?;
        Ok(Some(Event::TallyIncremented {
            count: self.tally,
            at: now,
        }))
    }

    pub fn reset_tally(&mut self) -> Result<Option<Event>> {
        let now = self.now();
        if self.gate.is_past_deadline(now) {
            debug!("tally reset rejected: season closed");
            return Ok(None);
        }
        commit(&mut self.store, keys::TALLY, &mut self.tally, 0)?;
        Ok(Some(Event::TallyReset { at: now }))
    }

    /// Create a goal. Gated like the other point-earning activity; blank text
    /// is ignored.
    pub fn add_goal(&mut self, text: &str, category: GoalCategory) -> Result<Option<Event>> {
        let now = self.now();
        if self.gate.is_past_deadline(now) {
            debug!("goal rejected: season closed");
            return Ok(None);
        }
        if text.trim().is_empty() {
            debug!("goal rejected: empty text");
            return Ok(None);
        }
        let goal = Goal::new(text, category);
        let event = Event::GoalAdded {
            id: goal.id.clone(),
            category,
            at: now,
        };
        let mut goals = self.goals.clone();
        goals.insert(0, goal);
        commit(&mut self.store, keys::GOALS, &mut self.goals, goals)?;
        Ok(Some(event))
    }

    // ── Ungated commands ─────────────────────────────────────────────

    pub fn toggle_goal(&mut self, id: &str) -> Result<Option<Event>> {
        let mut goals = self.goals.clone();
        let Some(goal) = goals.iter_mut().find(|g| g.id == id) else {
            debug!(id, "toggle ignored: unknown goal");
            return Ok(None);
        };
        goal.completed = !goal.completed;
        let completed = goal.completed;
        commit(&mut self.store, keys::GOALS, &mut self.goals, goals)?;
        Ok(Some(Event::GoalToggled {
            id: id.to_string(),
            completed,
            at: self.now(),
        }))
    }

    pub fn delete_goal(&mut self, id: &str) -> Result<Option<Event>> {
        let mut goals = self.goals.clone();
        goals.retain(|g| g.id != id);
        if goals.len() == self.goals.len() {
            debug!(id, "delete ignored: unknown goal");
            return Ok(None);
        }
        commit(&mut self.store, keys::GOALS, &mut self.goals, goals)?;
        Ok(Some(Event::GoalDeleted {
            id: id.to_string(),
            at: self.now(),
        }))
    }

    pub fn update_reminder_settings(&mut self, settings: ReminderSettings) -> Result<Event> {
        commit(&mut self.store, keys::REMINDERS, &mut self.reminders, settings.clamped())?;
        Ok(Event::ReminderSettingsChanged {
            settings: self.reminders,
            at: self.now(),
        })
    }

    /// Re-read the reminder settings blob, picking up changes written by
    /// another handle on the same store.
    pub fn reload_reminder_settings(&mut self) -> Result<ReminderSettings> {
        self.reminders = read_blob::<ReminderSettings>(&self.store, keys::REMINDERS)?
            .unwrap_or_default()
            .clamped();
        Ok(self.reminders)
    }
}

impl<S: BlobStore + Send> SettingsSource for Tracker<S> {
    fn current(&mut self) -> Option<ReminderSettings> {
        match self.reload_reminder_settings() {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!(error = %e, "keeping reminder settings; reload failed");
                None
            }
        }
    }
}

fn read_blob<T: DeserializeOwned>(store: &impl BlobStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| StorageError::CorruptBlob {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(value))
}

/// Persist `next`, then adopt it. On a failed write memory keeps the
/// previous value.
fn commit<T: Serialize>(
    store: &mut impl BlobStore,
    key: &str,
    slot: &mut T,
    next: T,
) -> Result<()> {
    write_blob(store, key, &next)?;
    *slot = next;
    Ok(())
}

fn write_blob<T: Serialize + ?Sized>(store: &mut impl BlobStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    // 2026-03-07 is a Saturday.
    fn saturday_at(hour: u32) -> Arc<FixedClock> {
        Arc::new(FixedClock::at(2026, 3, 7, hour, 0, 0).unwrap())
    }

    fn tracker(clock: Arc<FixedClock>) -> Tracker<MemoryStore> {
        Tracker::load(MemoryStore::new(), clock, DeadlineGate::default()).unwrap()
    }

    #[test]
    fn registers_open_session_once() {
        let mut t = tracker(saturday_at(5));
        assert_eq!(t.available_sessions(), vec![SessionName::SaturdayFajr]);

        let first = t
            .register_attendance(Presence::Present, SessionName::SaturdayFajr)
            .unwrap();
        assert!(matches!(first, Some(Event::AttendanceRegistered { .. })));
        assert!(t.available_sessions().is_empty());
        assert_eq!(t.open_sessions(), vec![SessionName::SaturdayFajr]);

        let second = t
            .register_attendance(Presence::Absent, SessionName::SaturdayFajr)
            .unwrap();
        assert!(second.is_none());
        assert_eq!(t.attendance().len(), 1);
        assert_eq!(t.attendance()[0].status, Presence::Present);
        assert_eq!(t.attendance()[0].display_date, "7/3/2026");
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: bool,
    }

    impl BlobStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Locked);
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let store = FlakyStore {
            fail_writes: true,
            ..FlakyStore::default()
        };
        let mut t = Tracker::load(store, saturday_at(5), DeadlineGate::default()).unwrap();

        assert!(t
            .register_attendance(Presence::Present, SessionName::SaturdayFajr)
            .is_err());
        assert!(t.increment_tally().is_err());
        assert!(t.add_goal("Fast Mondays", GoalCategory::Worship).is_err());
        assert!(t.attendance().is_empty());
        assert_eq!(t.tally(), 0);
        assert!(t.goals().is_empty());
        assert_eq!(t.available_sessions(), vec![SessionName::SaturdayFajr]);

        // The retry is not mistaken for a duplicate.
        t.store.fail_writes = false;
        assert!(t
            .register_attendance(Presence::Present, SessionName::SaturdayFajr)
            .unwrap()
            .is_some());
        assert_eq!(t.attendance().len(), 1);
    }

    #[test]
    fn reload_picks_up_settings_written_elsewhere() {
        let mut t = tracker(saturday_at(5));
        let mut other = t.store().clone();
        let disabled = serde_json::to_string(&ReminderSettings::new(false, 45).unwrap()).unwrap();
        other.set(keys::REMINDERS, &disabled).unwrap();
        t.store = other;
        assert_eq!(t.current(), Some(ReminderSettings::new(false, 45).unwrap()));
        assert_eq!(t.reminder_settings().minutes_before, 45);
    }

    #[test]
    fn closed_session_is_rejected() {
        let mut t = tracker(saturday_at(5));
        let event = t
            .register_attendance(Presence::Present, SessionName::SaturdayAsr)
            .unwrap();
        assert!(event.is_none());
        assert!(t.attendance().is_empty());
    }

    #[test]
    fn same_session_next_week_is_a_new_entry() {
        let clock = saturday_at(5);
        let mut t = tracker(clock.clone());
        t.register_attendance(Presence::Present, SessionName::SaturdayFajr)
            .unwrap();
        clock.advance(chrono::Duration::days(7));
        assert!(t
            .register_attendance(Presence::Absent, SessionName::SaturdayFajr)
            .unwrap()
            .is_some());
        assert_eq!(t.attendance().len(), 2);
        // newest first
        assert_eq!(t.attendance()[0].status, Presence::Absent);
    }

    #[test]
    fn prayer_slots_can_be_rewritten_and_cleared() {
        let mut t = tracker(saturday_at(5));
        t.set_prayer_status(PrayerSlot::Fajr, Some(Presence::Absent))
            .unwrap();
        t.set_prayer_status(PrayerSlot::Fajr, Some(Presence::Present))
            .unwrap();
        assert_eq!(t.today_prayers().fajr, Some(Presence::Present));
        assert_eq!(t.score(), 5);

        t.toggle_prayer_status(PrayerSlot::Fajr, Presence::Present)
            .unwrap();
        assert_eq!(t.today_prayers().fajr, None);
        assert_eq!(t.score(), 0);
        assert_eq!(t.prayer_history().len(), 1);
    }

    #[test]
    fn everything_point_earning_is_frozen_after_the_season() {
        let clock = Arc::new(FixedClock::at(2026, 8, 1, 9, 0, 0).unwrap());
        let mut t = tracker(clock);
        assert!(t.is_past_deadline());
        assert!(t
            .set_prayer_status(PrayerSlot::Isha, Some(Presence::Present))
            .unwrap()
            .is_none());
        assert!(t.increment_tally().unwrap().is_none());
        assert!(t.reset_tally().unwrap().is_none());
        assert!(t.add_goal("memorise", GoalCategory::Knowledge).unwrap().is_none());
        assert!(t.prayer_history().is_empty());
        assert_eq!(t.tally(), 0);
        assert!(!t.store().has(keys::PRAYER_HISTORY).unwrap());
    }

    #[test]
    fn goals_stay_manageable_after_the_season() {
        let clock = Arc::new(FixedClock::at(2026, 7, 31, 22, 0, 0).unwrap());
        let mut t = tracker(clock.clone());
        let Some(Event::GoalAdded { id, .. }) =
            t.add_goal("fast mondays", GoalCategory::Worship).unwrap()
        else {
            panic!("expected GoalAdded");
        };

        clock.advance(chrono::Duration::days(1));
        assert!(t.is_past_deadline());
        assert!(t.toggle_goal(&id).unwrap().is_some());
        assert!(t.goals()[0].completed);
        assert!(t.delete_goal(&id).unwrap().is_some());
        assert!(t.goals().is_empty());
    }

    #[test]
    fn blank_goal_and_unknown_ids_are_ignored() {
        let mut t = tracker(saturday_at(5));
        assert!(t.add_goal("   ", GoalCategory::General).unwrap().is_none());
        assert!(t.toggle_goal("missing").unwrap().is_none());
        assert!(t.delete_goal("missing").unwrap().is_none());
    }

    #[test]
    fn tally_counts_and_resets() {
        let mut t = tracker(saturday_at(5));
        for _ in 0..33 {
            t.increment_tally().unwrap();
        }
        assert_eq!(t.tally(), 33);
        assert_eq!(t.store().get(keys::TALLY).unwrap().as_deref(), Some("33"));
        t.reset_tally().unwrap();
        assert_eq!(t.tally(), 0);
    }

    #[test]
    fn state_survives_reload() {
        let clock = saturday_at(13);
        let mut t = tracker(clock.clone());
        t.register_attendance(Presence::Present, SessionName::SaturdayAsr)
            .unwrap();
        t.set_prayer_status(PrayerSlot::Maghrib, Some(Presence::Present))
            .unwrap();
        t.add_goal("charity", GoalCategory::Character).unwrap();
        t.increment_tally().unwrap();
        t.update_reminder_settings(ReminderSettings::new(true, 45).unwrap())
            .unwrap();

        let store = t.store().clone();
        let reloaded = Tracker::load(store, clock, DeadlineGate::default()).unwrap();
        assert_eq!(reloaded.attendance(), t.attendance());
        assert_eq!(reloaded.prayer_history(), t.prayer_history());
        assert_eq!(reloaded.goals(), t.goals());
        assert_eq!(reloaded.tally(), 1);
        assert_eq!(reloaded.reminder_settings().minutes_before, 45);
        assert_eq!(reloaded.score(), 10);
    }

    #[test]
    fn corrupt_blob_is_reported() {
        let mut store = MemoryStore::new();
        store.set(keys::GOALS, "{not json").unwrap();
        let result = Tracker::load(store, saturday_at(5), DeadlineGate::default());
        assert!(matches!(
            result,
            Err(crate::CoreError::Storage(StorageError::CorruptBlob { .. }))
        ));
    }
}
