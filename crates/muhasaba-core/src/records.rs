//! Plain records owned by the tracker.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::DayKey;
use crate::error::ValidationError;
use crate::sessions::SessionName;

/// Present/absent mark shared by attendance and prayer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl FromStr for Presence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" | "p" => Ok(Presence::Present),
            "absent" | "a" => Ok(Presence::Absent),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("expected present or absent, got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Present => f.write_str("present"),
            Presence::Absent => f.write_str("absent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub day_key: DayKey,
    pub display_date: String,
    pub lesson: SessionName,
    pub status: Presence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerSlot {
    Fajr,
    Maghrib,
    Isha,
}

impl PrayerSlot {
    pub const ALL: [PrayerSlot; 3] = [PrayerSlot::Fajr, PrayerSlot::Maghrib, PrayerSlot::Isha];
}

impl FromStr for PrayerSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fajr" => Ok(PrayerSlot::Fajr),
            "maghrib" => Ok(PrayerSlot::Maghrib),
            "isha" => Ok(PrayerSlot::Isha),
            other => Err(ValidationError::InvalidValue {
                field: "prayer".into(),
                message: format!("expected fajr, maghrib or isha, got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for PrayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrayerSlot::Fajr => f.write_str("fajr"),
            PrayerSlot::Maghrib => f.write_str("maghrib"),
            PrayerSlot::Isha => f.write_str("isha"),
        }
    }
}

/// Three independent slots for one calendar day. `None` means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrayerDay {
    #[serde(default)]
    pub fajr: Option<Presence>,
    #[serde(default)]
    pub maghrib: Option<Presence>,
    #[serde(default)]
    pub isha: Option<Presence>,
}

impl PrayerDay {
    pub fn get(&self, slot: PrayerSlot) -> Option<Presence> {
        match slot {
            PrayerSlot::Fajr => self.fajr,
            PrayerSlot::Maghrib => self.maghrib,
            PrayerSlot::Isha => self.isha,
        }
    }

    pub fn set(&mut self, slot: PrayerSlot, status: Option<Presence>) {
        match slot {
            PrayerSlot::Fajr => self.fajr = status,
            PrayerSlot::Maghrib => self.maghrib = status,
            PrayerSlot::Isha => self.isha = status,
        }
    }

    pub fn count(&self, status: Presence) -> usize {
        PrayerSlot::ALL
            .iter()
            .filter(|slot| self.get(**slot) == Some(status))
            .count()
    }

    pub fn present_count(&self) -> usize {
        self.count(Presence::Present)
    }

    pub fn is_complete(&self) -> bool {
        self.present_count() == PrayerSlot::ALL.len()
    }
}

pub type PrayerHistory = BTreeMap<DayKey, PrayerDay>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    #[default]
    Worship,
    Knowledge,
    Character,
    General,
}

impl FromStr for GoalCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worship" => Ok(GoalCategory::Worship),
            "knowledge" => Ok(GoalCategory::Knowledge),
            "character" => Ok(GoalCategory::Character),
            "general" => Ok(GoalCategory::General),
            other => Err(ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown goal category '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub text: String,
    pub category: GoalCategory,
    pub completed: bool,
}

impl Goal {
    pub fn new(text: &str, category: GoalCategory) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.trim().to_string(),
            category,
            completed: false,
        }
    }
}

pub const MAX_MINUTES_BEFORE: u32 = 120;
pub const DEFAULT_MINUTES_BEFORE: u32 = 30;

/// Fajr reminder preferences. Changeable at any time, season or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_minutes_before")]
    pub minutes_before: u32,
}

fn default_minutes_before() -> u32 {
    DEFAULT_MINUTES_BEFORE
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            minutes_before: DEFAULT_MINUTES_BEFORE,
        }
    }
}

impl ReminderSettings {
    pub fn new(enabled: bool, minutes_before: u32) -> Result<Self, ValidationError> {
        Self::default()
            .with_enabled(enabled)
            .with_minutes_before(minutes_before)
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_minutes_before(self, minutes_before: u32) -> Result<Self, ValidationError> {
        if minutes_before > MAX_MINUTES_BEFORE {
            return Err(ValidationError::OutOfRange {
                field: "minutes_before",
                min: 0,
                max: MAX_MINUTES_BEFORE as i64,
                value: minutes_before as i64,
            });
        }
        Ok(Self {
            minutes_before,
            ..self
        })
    }

    /// Pulls a stored value back into range.
    pub fn clamped(self) -> Self {
        Self {
            minutes_before: self.minutes_before.min(MAX_MINUTES_BEFORE),
            ..self
        }
    }
}
