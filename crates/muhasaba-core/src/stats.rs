//! Read-only summaries over attendance and prayer history.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::clock::DayKey;
use crate::records::{AttendanceEntry, PrayerHistory, PrayerSlot, Presence};
use crate::sessions::SessionName;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub present: u32,
    pub absent: u32,
}

impl Tally {
    fn add(&mut self, status: Option<Presence>) {
        match status {
            Some(Presence::Present) => self.present += 1,
            Some(Presence::Absent) => self.absent += 1,
            None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: u32,
    pub attendance: Tally,
    pub fajr: Tally,
    pub maghrib: Tally,
    pub isha: Tally,
    /// Distinct lessons with any entry this month.
    pub lessons: Vec<SessionName>,
}

/// One bar of a daily chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub label: String,
    pub value: u32,
}

/// Per-month totals. Entries are matched by the month of their day key, so
/// the same month of different years is pooled.
pub fn monthly_summary(
    attendance: &[AttendanceEntry],
    prayers: &PrayerHistory,
    months: RangeInclusive<u32>,
) -> Vec<MonthSummary> {
    months
        .map(|month| {
            let mut summary = MonthSummary {
                month,
                attendance: Tally::default(),
                fajr: Tally::default(),
                maghrib: Tally::default(),
                isha: Tally::default(),
                lessons: Vec::new(),
            };

            let mut lessons = BTreeSet::new();
            for entry in attendance.iter().filter(|a| a.day_key.month() == Some(month)) {
                summary.attendance.add(Some(entry.status));
                lessons.insert(entry.lesson);
            }
            summary.lessons = lessons.into_iter().collect();

            for day in prayers
                .iter()
                .filter(|(key, _)| key.month() == Some(month))
                .map(|(_, day)| day)
            {
                summary.fajr.add(day.get(PrayerSlot::Fajr));
                summary.maghrib.add(day.get(PrayerSlot::Maghrib));
                summary.isha.add(day.get(PrayerSlot::Isha));
            }
            summary
        })
        .collect()
}

/// Present prayers for each of the seven days ending `today`, oldest first.
pub fn prayer_week(prayers: &PrayerHistory, today: NaiveDate) -> Vec<DailyCount> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let value = prayers
                .get(&DayKey::from_date(date))
                .map_or(0, |day| day.present_count() as u32);
            DailyCount {
                label: format!("{}/{}", date.day(), date.month()),
                value,
            }
        })
        .collect()
}

/// Present attendance for the seven most recent dates with any entry,
/// oldest first.
pub fn attendance_by_date(attendance: &[AttendanceEntry]) -> Vec<DailyCount> {
    let mut dates: Vec<&str> = Vec::new();
    for entry in attendance {
        if !dates.contains(&entry.display_date.as_str()) {
            dates.push(&entry.display_date);
        }
    }
    dates.truncate(7);
    dates
        .into_iter()
        .rev()
        .map(|date| DailyCount {
            label: short_label(date),
            value: attendance
                .iter()
                .filter(|a| a.display_date == date && a.status == Presence::Present)
                .count() as u32,
        })
        .collect()
}

pub fn attendance_totals(attendance: &[AttendanceEntry]) -> Tally {
    let mut tally = Tally::default();
    for entry in attendance {
        tally.add(Some(entry.status));
    }
    tally
}

/// `"7/3/2026"` -> `"7/3"`.
fn short_label(display_date: &str) -> String {
    display_date.splitn(3, '/').take(2).collect::<Vec<_>>().join("/")
}
