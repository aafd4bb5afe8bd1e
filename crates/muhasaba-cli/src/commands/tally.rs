use clap::Subcommand;

use super::{open_tracker, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum TallyAction {
    /// Add one
    Inc,
    /// Back to zero
    Reset,
    /// Current count
    Show,
}

pub fn run(action: TallyAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        TallyAction::Inc => print_outcome(tracker.increment_tally()?, "season over")?,
        TallyAction::Reset => print_outcome(tracker.reset_tally()?, "season over")?,
        TallyAction::Show => print_json(&serde_json::json!({ "count": tracker.tally() }))?,
    }
    Ok(())
}
