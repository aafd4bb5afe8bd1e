use clap::Subcommand;
use muhasaba_core::{Presence, SessionName};

use super::{open_tracker, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum AttendanceAction {
    /// Register attendance for an open session
    Register {
        /// Session (Saturday-Fajr, Saturday-Asr, Wednesday-Maghrib)
        session: SessionName,
        /// present or absent
        status: Presence,
    },
    /// Sessions that can be registered right now
    Available,
    /// All registered entries, newest first
    List,
}

pub fn run(action: AttendanceAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        AttendanceAction::Register { session, status } => {
            let event = tracker.register_attendance(status, session)?;
            print_outcome(
                event,
                "session closed, already registered, or season over",
            )?;
        }
        AttendanceAction::Available => print_json(&tracker.available_sessions())?,
        AttendanceAction::List => print_json(tracker.attendance())?,
    }
    Ok(())
}
