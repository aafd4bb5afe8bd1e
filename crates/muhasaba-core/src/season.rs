//! Season deadline gate.
//!
//! After the season closes the tracker becomes read-only for anything that
//! earns points. Closing is not an error: callers consult the gate and quietly
//! skip the mutation.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_END_MONTH: u32 = 7;
pub const DEFAULT_END_YEAR: i32 = 2026;

/// Fixed `(end_month, end_year)` season boundary. The season is open through
/// the whole of `end_month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineGate {
    pub end_month: u32,
    pub end_year: i32,
}

impl Default for DeadlineGate {
    fn default() -> Self {
        Self {
            end_month: DEFAULT_END_MONTH,
            end_year: DEFAULT_END_YEAR,
        }
    }
}

impl DeadlineGate {
    pub fn new(end_month: u32, end_year: i32) -> Self {
        Self { end_month, end_year }
    }

    pub fn is_past_deadline(&self, now: NaiveDateTime) -> bool {
        past(self.end_month, self.end_year, now.month(), now.year())
    }

    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        !self.is_past_deadline(now)
    }

    /// Months covered by the monthly statistics report.
    pub fn season_months(&self) -> RangeInclusive<u32> {
        1..=self.end_month.clamp(1, 12)
    }
}

fn past(end_month: u32, end_year: i32, month: u32, year: i32) -> bool {
    year > end_year || (year == end_year && month > end_month)
}
