use clap::Subcommand;
use muhasaba_core::GoalCategory;

use super::{open_tracker, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Add a goal
    Add {
        /// Goal text
        text: String,
        /// worship, knowledge, character or general
        #[arg(long, default_value = "worship")]
        category: GoalCategory,
    },
    /// Flip a goal between open and completed
    Toggle {
        /// Goal ID
        id: String,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },
    /// List goals, newest first
    List,
}

pub fn run(action: GoalAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        GoalAction::Add { text, category } => {
            let event = tracker.add_goal(&text, category)?;
            print_outcome(event, "empty text or season over")?;
        }
        GoalAction::Toggle { id } => print_outcome(tracker.toggle_goal(&id)?, "unknown goal")?,
        GoalAction::Delete { id } => print_outcome(tracker.delete_goal(&id)?, "unknown goal")?,
        GoalAction::List => print_json(tracker.goals())?,
    }
    Ok(())
}
