//! Lesson registration windows.
//!
//! Attendance for a lesson can only be registered while its window is open.
//! Windows are a fixed weekly table; the resolver knows nothing about what has
//! already been recorded (see `Tracker::available_sessions`).

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionName {
    #[serde(rename = "Saturday-Fajr")]
    SaturdayFajr,
    #[serde(rename = "Saturday-Asr")]
    SaturdayAsr,
    #[serde(rename = "Wednesday-Maghrib")]
    WednesdayMaghrib,
}

impl SessionName {
    pub const ALL: [SessionName; 3] = [
        SessionName::SaturdayFajr,
        SessionName::SaturdayAsr,
        SessionName::WednesdayMaghrib,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionName::SaturdayFajr => "Saturday-Fajr",
            SessionName::SaturdayAsr => "Saturday-Asr",
            SessionName::WednesdayMaghrib => "Wednesday-Maghrib",
        }
    }

    pub fn window(self) -> &'static SessionWindow {
        // ALL and WINDOWS share order.
        &WINDOWS[self as usize]
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionName::ALL
            .into_iter()
            .find(|name| name.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "session".into(),
                message: format!("unknown session '{s}'"),
            })
    }
}

/// One row of the weekly table: `[start_hour, end_hour)` on `weekday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub session: SessionName,
    pub weekday: Weekday,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SessionWindow {
    pub fn contains(&self, weekday: Weekday, hour: u32) -> bool {
        self.weekday == weekday && (self.start_hour..self.end_hour).contains(&hour)
    }
}

pub static WINDOWS: [SessionWindow; 3] = [
    SessionWindow {
        session: SessionName::SaturdayFajr,
        weekday: Weekday::Sat,
        start_hour: 3,
        end_hour: 12,
    },
    SessionWindow {
        session: SessionName::SaturdayAsr,
        weekday: Weekday::Sat,
        start_hour: 12,
        end_hour: 20,
    },
    SessionWindow {
        session: SessionName::WednesdayMaghrib,
        weekday: Weekday::Wed,
        start_hour: 15,
        end_hour: 23,
    },
];

/// Sessions whose window contains `(weekday, hour)`, in table order.
pub fn open_sessions(weekday: Weekday, hour: u32) -> Vec<SessionName> {
    WINDOWS
        .iter()
        .filter(|w| w.contains(weekday, hour))
        .map(|w| w.session)
        .collect()
}

pub fn is_open(session: SessionName, weekday: Weekday, hour: u32) -> bool {
    session.window().contains(weekday, hour)
}
