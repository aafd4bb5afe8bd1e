use clap::Subcommand;
use muhasaba_core::stats;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Per-month totals for the season
    Monthly,
    /// Prayers over the last seven days and attendance over the last seven
    /// lesson dates
    Week,
}

pub fn run(action: StatsAction) -> CliResult {
    let tracker = open_tracker()?;

    match action {
        StatsAction::Monthly => {
            let months = tracker.gate().season_months();
            let summary =
                stats::monthly_summary(tracker.attendance(), tracker.prayer_history(), months);
            print_json(&summary)?;
        }
        StatsAction::Week => {
            let today = tracker.now().date();
            print_json(&serde_json::json!({
                "prayers": stats::prayer_week(tracker.prayer_history(), today),
                "attendance": stats::attendance_by_date(tracker.attendance()),
                "totals": stats::attendance_totals(tracker.attendance()),
            }))?;
        }
    }
    Ok(())
}
