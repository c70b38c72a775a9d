//! Recurring trigger for the low-stock notifier.
//!
//! Scheduled runs are serialized: the loop awaits each cycle before looking
//! for the next fire time, and fire times that passed while a cycle was
//! running are skipped. Manual runs go through [`ManualTrigger`] and may
//! overlap a scheduled run.

mod cron;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::notifications::{CycleOutcome, LowStockNotifier, NotifierError};

pub use cron::{CronError, CronSchedule};

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Runs the notifier on demand, tracking in-flight cycles.
#[derive(Clone)]
pub struct ManualTrigger {
    notifier: LowStockNotifier,
    in_flight: Arc<AtomicUsize>,
}

impl ManualTrigger {
    pub fn new(notifier: LowStockNotifier) -> Self {
        Self {
            notifier,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run one cycle now and return its outcome, including hard failures.
    pub async fn run_now(&self) -> Result<CycleOutcome, NotifierError> {
        let _running = InFlight::enter(&self.in_flight);
        self.notifier.run_notification_cycle().await
    }

    pub fn state(&self) -> SchedulerState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }
}

/// Decrements the in-flight counter on drop, including on cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A cron cadence in a named timezone, bound to a notifier.
///
/// Clones of the trigger passed in share its running state with the
/// scheduled loop.
#[derive(Clone)]
pub struct NotificationScheduler {
    schedule: CronSchedule,
    timezone: Tz,
    trigger: ManualTrigger,
}

impl NotificationScheduler {
    pub fn new(schedule: CronSchedule, timezone: Tz, trigger: ManualTrigger) -> Self {
        Self {
            schedule,
            timezone,
            trigger,
        }
    }

    pub fn manual_trigger(&self) -> ManualTrigger {
        self.trigger.clone()
    }

    /// Register the recurring trigger. Must be called inside a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let trigger = self.trigger.clone();
        let join = tokio::spawn(run_loop(self.schedule, self.timezone, self.trigger, shutdown_rx));

        SchedulerHandle {
            trigger,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        }
    }
}

/// Owns the scheduler registration. Dropping it also stops the loop.
pub struct SchedulerHandle {
    trigger: ManualTrigger,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        self.trigger.state()
    }

    pub fn manual_trigger(&self) -> ManualTrigger {
        self.trigger.clone()
    }

    /// Stop the loop and wait for it. A cycle already running is allowed to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                error!(error = %err, "scheduler task ended abnormally");
            }
        }
    }
}

async fn run_loop(
    schedule: CronSchedule,
    timezone: Tz,
    trigger: ManualTrigger,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!(schedule = %schedule, timezone = %timezone, "low-stock notifications scheduled");

    let mut last_fire: Option<DateTime<Utc>> = None;
    loop {
        let now = Utc::now();
        let Some(next) = next_fire(&schedule, &timezone, last_fire, now) else {
            warn!(schedule = %schedule, "schedule never fires again, stopping");
            break;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(next = %next, "next low-stock notification run");

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(wait) => {}
        }

        last_fire = Some(next);
        match trigger.run_now().await {
            Ok(outcome) => debug!(?outcome, "scheduled low-stock cycle done"),
            Err(err) => error!(error = %err, "scheduled low-stock cycle failed"),
        }
    }

    info!("low-stock scheduler stopped");
}

/// The next fire time after both the previous fire and `now`.
///
/// Fire times that passed while a cycle was running are skipped, and a
/// fire time is never repeated even if the clock reads slightly behind it.
fn next_fire(
    schedule: &CronSchedule,
    timezone: &Tz,
    last_fire: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let from = last_fire.map_or(now, |last| last.max(now));
    schedule.next_after(from, timezone)
}
