use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "muhasaba", version, about = "Muhasaba CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lesson attendance
    Attendance {
        #[command(subcommand)]
        action: commands::attendance::AttendanceAction,
    },
    /// Today's prayers
    Prayer {
        #[command(subcommand)]
        action: commands::prayer::PrayerAction,
    },
    /// Tasbeeh counter
    Tally {
        #[command(subcommand)]
        action: commands::tally::TallyAction,
    },
    /// Personal goals
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Season score
    Score,
    /// Attendance and prayer statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Fajr reminder
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MUHASABA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Attendance { action } => commands::attendance::run(action),
        Commands::Prayer { action } => commands::prayer::run(action),
        Commands::Tally { action } => commands::tally::run(action),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Score => commands::score::run(),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
