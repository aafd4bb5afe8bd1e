//! One-second polling for the reminder scheduler.
//!
//! [`ReminderTimer`] is a registered tokio interval task; dropping it cancels
//! the task. [`ReminderService`] keeps a timer alive only while the scheduler
//! can fire (enabled with an anchor) and drops it on every other path:
//! disabling, clearing the anchor, a failed lookup, or the service itself
//! being dropped.
//!
//! With a [`SettingsSource`] attached, every poll first re-reads the
//! persisted settings, so a change written by another process (for example
//! disabling the reminder) applies before the next firing check.
//!
//! Starting the timer requires a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::anchor::{self, AnchorTime, Locator, PrayerTimeService};
use super::notifier::Notifier;
use super::scheduler::{ReminderScheduler, ReminderStatus};
use crate::clock::Clock;
use crate::error::AnchorError;
use crate::events::Event;
use crate::records::ReminderSettings;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Latest persisted reminder settings. `None` keeps the current ones.
pub trait SettingsSource: Send {
    fn current(&mut self) -> Option<ReminderSettings>;
}

type SharedSource = Arc<Mutex<Box<dyn SettingsSource>>>;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running poll task. Cancelled on drop.
pub struct ReminderTimer {
    handle: JoinHandle<()>,
}

impl ReminderTimer {
    pub fn start<N>(
        scheduler: Arc<Mutex<ReminderScheduler>>,
        notifier: Arc<Mutex<N>>,
        clock: Arc<dyn Clock>,
        period: Duration,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self
    where
        N: Notifier + Send + 'static,
    {
        Self::start_with_source(scheduler, notifier, None, clock, period, events)
    }

    fn start_with_source<N>(
        scheduler: Arc<Mutex<ReminderScheduler>>,
        notifier: Arc<Mutex<N>>,
        source: Option<SharedSource>,
        clock: Arc<dyn Clock>,
        period: Duration,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self
    where
        N: Notifier + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let now = clock.now();
                let latest = source.as_ref().and_then(|s| lock(s).current());
                let emitted: Vec<Event> = {
                    let mut scheduler = lock(&scheduler);
                    let changed = latest
                        .filter(|settings| *settings != scheduler.settings())
                        .and_then(|settings| scheduler.update_settings(settings, now));
                    let mut notifier = lock(&notifier);
                    let fired = scheduler.tick(now, &mut *notifier);
                    changed.into_iter().chain(fired).collect()
                };
                for event in emitted {
                    if events.send(event).is_err() {
                        tracing::debug!("event receiver dropped");
                    }
                }
            }
        });
        tracing::debug!(?period, "reminder timer started");
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ReminderTimer {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("reminder timer cancelled");
    }
}

/// Scheduler plus the timer that drives it.
pub struct ReminderService<N: Notifier + Send + 'static> {
    scheduler: Arc<Mutex<ReminderScheduler>>,
    notifier: Arc<Mutex<N>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    events: mpsc::UnboundedSender<Event>,
    source: Option<SharedSource>,
    timer: Option<ReminderTimer>,
}

impl<N: Notifier + Send + 'static> ReminderService<N> {
    /// Events emitted by the timer (firings) arrive on the returned receiver.
    pub fn new(
        scheduler: ReminderScheduler,
        notifier: N,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let service = Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            notifier: Arc::new(Mutex::new(notifier)),
            clock,
            period,
            events,
            source: None,
            timer: None,
        };
        (service, receiver)
    }

    /// Re-read settings from `source` before every poll. The timer then runs
    /// whenever an anchor is set, so re-enabling elsewhere also takes effect.
    pub fn with_settings_source(mut self, source: impl SettingsSource + 'static) -> Self {
        let source: Box<dyn SettingsSource> = Box::new(source);
        self.source = Some(Arc::new(Mutex::new(source)));
        self.sync_timer();
        self
    }

    pub fn status(&self) -> ReminderStatus {
        lock(&self.scheduler).status()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn notifier(&self) -> Arc<Mutex<N>> {
        Arc::clone(&self.notifier)
    }

    pub fn update_settings(&mut self, settings: ReminderSettings) -> Option<Event> {
        let now = self.clock.now();
        let event = lock(&self.scheduler).update_settings(settings, now);
        self.sync_timer();
        event
    }

    pub fn set_anchor(&mut self, anchor: AnchorTime) -> Option<Event> {
        let now = self.clock.now();
        let event = lock(&self.scheduler).set_anchor(anchor, now);
        self.sync_timer();
        event
    }

    pub fn clear_anchor(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let event = lock(&self.scheduler).clear_anchor(now);
        self.sync_timer();
        event
    }

    /// Locate, look up today's anchor and arm. Call once per session; calling
    /// it again is the manual retry after a failure.
    pub async fn acquire_anchor<L, P>(&mut self, locator: &L, service: &P) -> Event
    where
        L: Locator,
        P: PrayerTimeService,
    {
        let today = self.clock.now().date();
        let result = anchor::acquire(locator, service, today).await;
        self.apply_anchor(result)
    }

    pub fn apply_anchor(&mut self, result: Result<AnchorTime, AnchorError>) -> Event {
        let now = self.clock.now();
        let event = match result {
            Ok(anchor) => {
                lock(&self.scheduler).set_anchor(anchor, now);
                Event::AnchorAcquired {
                    anchor: anchor.time(),
                    at: now,
                }
            }
            Err(error) => lock(&self.scheduler).anchor_failed(error, now),
        };
        self.sync_timer();
        event
    }

    pub fn stop(&mut self) {
        self.timer = None;
    }

    fn sync_timer(&mut self) {
        let armable = {
            let scheduler = lock(&self.scheduler);
            scheduler.is_armable() || (self.source.is_some() && scheduler.anchor().is_some())
        };
        match (armable, self.timer.is_some()) {
            (true, false) => {
                self.timer = Some(ReminderTimer::start_with_source(
                    Arc::clone(&self.scheduler),
                    Arc::clone(&self.notifier),
                    self.source.clone(),
                    Arc::clone(&self.clock),
                    self.period,
                    self.events.clone(),
                ));
            }
            (false, true) => self.timer = None,
            _ => {}
        }
    }
}
