//! The polling loops.
//!
//! Three timers (world state, notifications, update check) run as independent tasks and only
//! emit [`Tick`]s. A dispatcher turns each tick into a work task, so a slow cycle never delays
//! another timer or the next tick of its own timer. Snapshot replacements are forwarded to the
//! edge-triggered image-set check.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{
    sync::{mpsc, Mutex as AsyncMutex},
    task::JoinSet,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{engine::Engine, models::ImageSetKey, DockwatchError, DockwatchResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Ticks buffered between the timers and the dispatcher.
const TICK_CHANNEL_CAPACITY: usize = 16;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Lifecycle of the scheduler. There is no paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timer is running.
    Stopped,

    /// All three timers are running.
    Running,
}

/// A timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tick {
    /// Refresh status, containers and images.
    WorldState,

    /// Merge the backend's notifications.
    Notifications,

    /// Re-evaluate the image-set trigger.
    UpdateCheck,
}

/// Owns the three polling timers and their lifecycle.
pub struct PollingScheduler {
    engine: Arc<Engine>,
    running: AsyncMutex<Option<RunningScheduler>>,
}

struct RunningScheduler {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

/// Edge detector for the image list. Fires once per distinct [`ImageSetKey`].
#[derive(Debug, Default)]
pub struct ImageSetTrigger {
    state: Mutex<TriggerState>,
}

#[derive(Debug, Default)]
struct TriggerState {
    last: Option<ImageSetKey>,
    running: bool,
}

/// The outcome of evaluating the image-set trigger.
#[derive(Debug)]
pub enum TriggerDecision<'a> {
    /// The image list changed. The pass counts as running until the guard is dropped.
    Fire(TriggerPass<'a>),

    /// The image list is the one last checked.
    Unchanged,

    /// The image list changed but a pass is still running. The change stays pending.
    Busy,
}

/// Marks an update-check pass as running.
#[derive(Debug)]
pub struct TriggerPass<'a> {
    trigger: &'a ImageSetTrigger,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PollingScheduler {
    /// Creates a stopped scheduler driving `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            running: AsyncMutex::new(None),
        }
    }

    /// Starts the three timers. Each fires immediately and then once per configured period.
    pub async fn start(&self) -> DockwatchResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(DockwatchError::SchedulerAlreadyRunning);
        }

        let config = self.engine.config();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);
        let mut tasks = JoinSet::new();

        let timers = [
            (Tick::WorldState, *config.refresh_interval()),
            (Tick::Notifications, *config.notification_interval()),
            (Tick::UpdateCheck, *config.update_check_interval()),
        ];
        for (tick, period) in timers {
            tasks.spawn(run_timer(tick, period, tx.clone(), cancel.clone()));
        }
        tasks.spawn(run_dispatcher(self.engine.clone(), rx, cancel.clone()));

        tracing::info!(
            refresh = ?config.refresh_interval(),
            notifications = ?config.notification_interval(),
            update_check = ?config.update_check_interval(),
            "polling scheduler started"
        );

        *running = Some(RunningScheduler { cancel, tasks });
        Ok(())
    }

    /// Stops all timers. Work still in flight is abandoned. Stopping a stopped scheduler does
    /// nothing.
    pub async fn stop(&self) -> DockwatchResult<()> {
        let Some(RunningScheduler { cancel, mut tasks }) = self.running.lock().await.take() else {
            return Ok(());
        };

        cancel.cancel();
        while let Some(result) = tasks.join_next().await {
            result?;
        }

        tracing::info!("polling scheduler stopped");
        Ok(())
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> SchedulerState {
        match *self.running.lock().await {
            Some(_) => SchedulerState::Running,
            None => SchedulerState::Stopped,
        }
    }

    /// The engine this scheduler drives.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}

impl ImageSetTrigger {
    /// Creates a trigger that fires on the first non-initial image list it sees.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `key` with the last image list a pass was started for.
    pub fn evaluate(&self, key: ImageSetKey) -> TriggerDecision<'_> {
        let mut state = self.lock();
        if state.last.as_ref() == Some(&key) {
            return TriggerDecision::Unchanged;
        }

        if state.running {
            return TriggerDecision::Busy;
        }

        state.last = Some(key);
        state.running = true;
        TriggerDecision::Fire(TriggerPass { trigger: self })
    }

    /// Whether a pass is running.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn lock(&self) -> MutexGuard<'_, TriggerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

async fn run_timer(
    tick: Tick,
    period: Duration,
    tx: mpsc::Sender<Tick>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if tx.send(tick).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::trace!(?tick, "timer stopped");
}

async fn run_dispatcher(
    engine: Arc<Engine>,
    mut ticks: mpsc::Receiver<Tick>,
    cancel: CancellationToken,
) {
    let mut snapshots = engine.watch_snapshots();
    let mut work = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(tick) = ticks.recv() => {
                tracing::trace!(?tick, in_flight = work.len(), "tick");
                spawn_work(&mut work, &engine, tick);
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                spawn_work(&mut work, &engine, Tick::UpdateCheck);
            }
            Some(result) = work.join_next(), if !work.is_empty() => {
                if let Err(e) = result {
                    if e.is_panic() {
                        tracing::error!(error = %e, "polling task panicked");
                    }
                }
            }
        }
    }

    work.shutdown().await;
}

fn spawn_work(work: &mut JoinSet<()>, engine: &Arc<Engine>, tick: Tick) {
    let engine = engine.clone();
    match tick {
        Tick::WorldState => {
            work.spawn(async move {
                // Failures are logged and reported as events by the engine.
                let _ = engine.refresh_world_state().await;
            });
        }
        Tick::Notifications => {
            work.spawn(async move {
                let _ = engine.refresh_notifications().await;
            });
        }
        Tick::UpdateCheck => {
            work.spawn(async move {
                engine.evaluate_update_trigger().await;
            });
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Drop for TriggerPass<'_> {
    fn drop(&mut self) {
        self.trigger.lock().running = false;
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
