use std::str::FromStr;

use clap::Subcommand;
use muhasaba_core::{PrayerSlot, Presence};

use super::{open_tracker, print_json, print_outcome, CliResult};

/// `present`, `absent` or `unset`.
#[derive(Clone, Copy)]
pub struct PrayerMark(Option<Presence>);

impl FromStr for PrayerMark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("unset") {
            return Ok(Self(None));
        }
        Presence::from_str(s)
            .map(|p| Self(Some(p)))
            .map_err(|e| e.to_string())
    }
}

#[derive(Subcommand)]
pub enum PrayerAction {
    /// Set one of today's prayers
    Set {
        /// fajr, maghrib or isha
        slot: PrayerSlot,
        /// present, absent or unset
        status: PrayerMark,
    },
    /// Today's prayer record
    Today,
}

pub fn run(action: PrayerAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        PrayerAction::Set { slot, status } => {
            let event = tracker.set_prayer_status(slot, status.0)?;
            print_outcome(event, "season over")?;
        }
        PrayerAction::Today => print_json(&tracker.today_prayers())?,
    }
    Ok(())
}
