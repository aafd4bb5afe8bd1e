use super::{open_tracker, print_json, CliResult};

pub fn run() -> CliResult {
    let tracker = open_tracker()?;
    print_json(&tracker.score_breakdown())
}
