use std::io::Write;

use clap::Subcommand;
use muhasaba_core::{
    AladhanClient, AnchorTime, Config, Event, NotificationPermission, Notifier, ReminderScheduler,
    ReminderService, StaticLocator,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Current reminder settings
    Show,
    /// Turn the Fajr reminder on
    Enable,
    /// Turn the Fajr reminder off
    Disable,
    /// Minutes before Fajr to fire (0-120)
    Offset {
        minutes: u32,
    },
    /// Look up today's Fajr time and wait for the reminder until Ctrl-C.
    /// Enter retries the lookup.
    Watch {
        /// Use this Fajr time (HH:MM) instead of looking it up
        #[arg(long)]
        anchor: Option<AnchorTime>,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    let mut tracker = open_tracker()?;
    let settings = tracker.reminder_settings();

    match action {
        ReminderAction::Show => print_json(&settings)?,
        ReminderAction::Enable => {
            print_json(&tracker.update_reminder_settings(settings.with_enabled(true))?)?
        }
        ReminderAction::Disable => {
            print_json(&tracker.update_reminder_settings(settings.with_enabled(false))?)?
        }
        ReminderAction::Offset { minutes } => {
            let settings = settings.with_minutes_before(minutes)?;
            print_json(&tracker.update_reminder_settings(settings)?)?;
        }
        ReminderAction::Watch { anchor } => {
            let config = Config::load_or_default();
            let scheduler = ReminderScheduler::new(settings).with_notification(
                config.notifications.title.clone(),
                config.notifications.vibration.clone(),
            );
            let clock = tracker.clock().clone();
            let (service, events) =
                ReminderService::new(scheduler, TerminalNotifier, clock, config.poll_interval());
            // Settings changed by other invocations apply on the next poll.
            let service = service.with_settings_source(tracker);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(watch(service, events, anchor, &config))?;
        }
    }
    Ok(())
}

async fn watch(
    mut service: ReminderService<TerminalNotifier>,
    mut events: UnboundedReceiver<Event>,
    anchor: Option<AnchorTime>,
    config: &Config,
) -> CliResult {
    acquire(&mut service, anchor, config).await?;
    eprintln!("watching; press Enter to retry the prayer time lookup, Ctrl-C to stop");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            Some(event) = events.recv() => print_line(&event)?,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => acquire(&mut service, anchor, config).await?,
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    service.stop();
    Ok(())
}

/// Obtain today's anchor, from `--anchor` or the prayer time service, and
/// print the outcome.
async fn acquire(
    service: &mut ReminderService<TerminalNotifier>,
    anchor: Option<AnchorTime>,
    config: &Config,
) -> CliResult {
    let outcome = match anchor {
        Some(anchor) => service.apply_anchor(Ok(anchor)),
        None => {
            let prayer_times = &config.prayer_times;
            let locator = StaticLocator::from_parts(prayer_times.latitude, prayer_times.longitude);
            let client = AladhanClient::new(prayer_times.base_url.clone(), prayer_times.method);
            service.acquire_anchor(&locator, &client).await
        }
    };
    print_line(&outcome)?;
    print_json(&service.status())
}

fn print_line<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Writes reminders to the terminal with a bell.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&mut self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn notify(&mut self, title: &str, body: &str) {
        let mut stderr = std::io::stderr();
        if let Err(e) = writeln!(stderr, "\x07{title}: {body}") {
            tracing::warn!(error = %e, "failed to write reminder");
        }
    }
}
