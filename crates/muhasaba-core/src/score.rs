//! Point total derived from attendance and prayer history.
//!
//! Recomputed from the full history on every call. Histories are personal and
//! small, so there is no incremental state to keep in sync.

use serde::{Deserialize, Serialize};

use crate::records::{AttendanceEntry, PrayerHistory, Presence};

pub const POINTS_PER_ENTRY: u32 = 5;
pub const MAX_SCORE: u32 = 120;

pub fn attendance_points(attendance: &[AttendanceEntry]) -> u32 {
    let present = attendance
        .iter()
        .filter(|a| a.status == Presence::Present)
        .count();
    points(present)
}

pub fn prayer_points(history: &PrayerHistory) -> u32 {
    let present: usize = history.values().map(|day| day.present_count()).sum();
    points(present)
}

/// Capped score in `[0, MAX_SCORE]`.
pub fn compute_score(attendance: &[AttendanceEntry], history: &PrayerHistory) -> u32 {
    attendance_points(attendance)
        .saturating_add(prayer_points(history))
        .min(MAX_SCORE)
}

fn points(count: usize) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(POINTS_PER_ENTRY)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub attendance_points: u32,
    /// Uncapped.
    pub prayer_points: u32,
    pub total: u32,
    pub max: u32,
    pub progress_pct: f64,
}

impl ScoreBreakdown {
    pub fn compute(attendance: &[AttendanceEntry], history: &PrayerHistory) -> Self {
        let total = compute_score(attendance, history);
        Self {
            attendance_points: attendance_points(attendance),
            prayer_points: prayer_points(history),
            total,
            max: MAX_SCORE,
            progress_pct: f64::from(total) / f64::from(MAX_SCORE) * 100.0,
        }
    }
}
