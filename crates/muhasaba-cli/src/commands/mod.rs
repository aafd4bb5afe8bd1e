pub mod attendance;
pub mod config;
pub mod goal;
pub mod prayer;
pub mod reminder;
pub mod score;
pub mod stats;
pub mod tally;

use std::sync::Arc;

use muhasaba_core::{Config, Database, Event, SystemClock, Tracker};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk store with the configured season gate.
pub fn open_tracker() -> Result<Tracker<Database>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    Ok(Tracker::load(db, Arc::new(SystemClock), config.gate())?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the event, or `null` when the tracker declined the change.
pub fn print_outcome(event: Option<Event>, ignored: &str) -> CliResult {
    if event.is_none() {
        eprintln!("ignored: {ignored}");
    }
    print_json(&event)
}
