//! The engine facade tying the fetcher, stores, checkers and actions together.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{broadcast, watch};

use crate::{
    actions::{ActionOutcome, ActionRunner},
    backend::{DashboardBackend, HttpBackend},
    config::EngineConfig,
    detail::{ContainerDetail, DetailAggregator, DetailField},
    fetcher::{DataFetcher, RefreshOutcome},
    models::{
        BackendMode, ContainerAction, ContainerStats, Notification, StateSnapshot,
        UpdateAvailability,
    },
    notifications::NotificationStore,
    scheduler::{ImageSetTrigger, TriggerDecision},
    source::Sources,
    state::{CycleFailure, SnapshotStore},
    updates::{UpdateChecker, UpdatePass},
    DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Number of events a slow subscriber may fall behind before it starts missing them.
const EVENT_CHANNEL_CAPACITY: usize = 64;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Something UI layers may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A refresh cycle published a new snapshot.
    SnapshotUpdated {
        /// Generation of the published snapshot.
        generation: u64,

        /// Mode of the published snapshot.
        mode: BackendMode,
    },

    /// A refresh cycle failed. The previous snapshot is still published.
    RefreshFailed {
        /// Rendered error.
        message: String,

        /// Whether no snapshot had loaded yet, so the failure affects the initial load.
        initial_load: bool,
    },

    /// An update-check pass found tags with newly available updates.
    UpdatesFound {
        /// The tags, in image list order.
        tags: Vec<String>,
    },

    /// Notifications were added or changed read state.
    NotificationsChanged {
        /// Unread count after the change.
        unread: usize,
    },
}

/// The synchronization engine: shared state plus every operation the polling loops and the UI
/// call into.
pub struct Engine {
    config: EngineConfig,
    backend: Arc<dyn DashboardBackend>,
    store: Arc<SnapshotStore>,
    fetcher: Arc<DataFetcher>,
    notifications: Arc<NotificationStore>,
    updates: UpdateChecker,
    details: DetailAggregator,
    actions: ActionRunner,
    trigger: ImageSetTrigger,
    events: broadcast::Sender<EngineEvent>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Engine {
    /// Creates an engine over `backend`.
    pub fn new(config: EngineConfig, backend: Arc<dyn DashboardBackend>) -> DockwatchResult<Self> {
        config.validate()?;

        let store = Arc::new(SnapshotStore::new());
        let sources = Sources::new(backend.clone(), *config.log_tail());
        let fetcher = Arc::new(DataFetcher::new(
            backend.clone(),
            sources.clone(),
            store.clone(),
        ));
        let notifications = Arc::new(NotificationStore::new());
        let updates = UpdateChecker::new(
            backend.clone(),
            notifications.clone(),
            *config.update_check_limit(),
        );
        let details = DetailAggregator::new(sources.clone(), store.clone());
        let actions = ActionRunner::new(sources, fetcher.clone(), notifications.clone());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            backend,
            store,
            fetcher,
            notifications,
            updates,
            details,
            actions,
            trigger: ImageSetTrigger::new(),
            events,
        })
    }

    /// Creates an engine talking to the backend at [`EngineConfig::backend_url`] over HTTP.
    pub fn connect(config: EngineConfig) -> DockwatchResult<Self> {
        let backend = HttpBackend::new(&config)?;
        Self::new(config, Arc::new(backend))
    }

    /// Runs one world-state refresh cycle.
    ///
    /// A failure leaves the published snapshot untouched. It is logged as a warning once a
    /// snapshot exists and as an error while the initial load has not succeeded.
    pub async fn refresh_world_state(&self) -> DockwatchResult<Arc<StateSnapshot>> {
        let result = self.fetcher.refresh().await;
        self.report_refresh(&result);
        result.map(|outcome| outcome.snapshot)
    }

    /// Merges the backend's notifications into the store. Skipped in demo mode. Returns how many
    /// notifications were new.
    pub async fn refresh_notifications(&self) -> DockwatchResult<usize> {
        if self.store.current().mode() == BackendMode::Demo {
            tracing::trace!("skipping notification poll in demo mode");
            return Ok(0);
        }

        let remote = match self.backend.fetch_notifications().await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(error = %e, "notification refresh failed");
                return Err(e);
            }
        };

        let added = self.notifications.merge(remote).await;
        if added > 0 {
            self.notifications_changed().await;
        }

        Ok(added)
    }

    /// Runs an update-check pass if the image list changed since the last pass.
    ///
    /// Returns `None` when nothing changed, when no snapshot has loaded yet, or when a pass is
    /// already running. A pass skipped for that last reason leaves the change pending, so the
    /// next evaluation picks it up.
    pub async fn evaluate_update_trigger(&self) -> Option<UpdatePass> {
        let snapshot = self.store.current();
        if snapshot.is_initial() {
            return None;
        }

        let _running = match self.trigger.evaluate(snapshot.image_set_key()) {
            TriggerDecision::Fire(running) => running,
            TriggerDecision::Unchanged => return None,
            TriggerDecision::Busy => {
                tracing::debug!("update check already running, deferring image list change");
                return None;
            }
        };

        tracing::debug!(
            generation = snapshot.generation(),
            images = snapshot.images.len(),
            "image list changed, checking for updates"
        );

        let pass = self.updates.run_pass(&snapshot.images, snapshot.mode()).await;
        if !pass.newly_available.is_empty() {
            self.emit(EngineEvent::UpdatesFound {
                tags: pass.newly_available.clone(),
            });
            self.notifications_changed().await;
        }

        Some(pass)
    }

    /// Selects a container and loads its detail.
    pub async fn open_detail(&self, container_id: &str) -> ContainerDetail {
        self.details.open_detail(container_id).await
    }

    /// Re-fetches stats for the selected container.
    pub async fn refresh_detail_stats(&self) -> Option<DetailField<ContainerStats>> {
        self.details.refresh_stats().await
    }

    /// Clears the container selection.
    pub async fn close_detail(&self) {
        self.details.close_detail().await
    }

    /// The selected container's detail, possibly still loading.
    pub async fn current_detail(&self) -> Option<ContainerDetail> {
        self.details.current_detail().await
    }

    /// Requests a lifecycle action on a container.
    pub async fn perform_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<ActionOutcome> {
        let result = self.actions.perform(container_id, action).await;

        if let Ok(ActionOutcome {
            refresh: Some(refresh),
            ..
        }) = &result
        {
            self.report_refresh(refresh);
        }
        self.notifications_changed().await;

        result
    }

    /// Marks a notification as read.
    pub async fn mark_read(&self, id: &str) -> bool {
        let changed = self.notifications.mark_read(id).await;
        if changed {
            self.notifications_changed().await;
        }
        changed
    }

    /// Marks every notification as read.
    pub async fn mark_all_read(&self) -> usize {
        let changed = self.notifications.mark_all_read().await;
        if changed > 0 {
            self.notifications_changed().await;
        }
        changed
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self) -> usize {
        self.notifications.unread_count().await
    }

    /// All notifications, most recent first.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.list().await
    }

    /// Update availability recorded so far, by image tag.
    pub async fn update_availability(&self) -> HashMap<String, UpdateAvailability> {
        self.updates.availability().await
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.store.current()
    }

    /// The most recent refresh failure newer than the published snapshot.
    pub fn last_failure(&self) -> Option<CycleFailure> {
        self.store.last_failure()
    }

    /// Subscribes to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Subscribes to snapshot replacements.
    pub fn watch_snapshots(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.store.subscribe()
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Emits the events for a finished refresh cycle. A stale cycle emits nothing.
    fn report_refresh(&self, result: &DockwatchResult<RefreshOutcome>) {
        match result {
            Ok(outcome) if outcome.applied => self.emit(EngineEvent::SnapshotUpdated {
                generation: outcome.snapshot.generation(),
                mode: outcome.snapshot.mode(),
            }),
            Ok(_) => {}
            Err(e) => {
                let initial_load = !self.store.has_loaded();
                if initial_load {
                    tracing::error!(error = %e, "initial world-state load failed");
                } else {
                    tracing::warn!(error = %e, "world-state refresh failed, keeping last snapshot");
                }

                self.emit(EngineEvent::RefreshFailed {
                    message: e.to_string(),
                    initial_load,
                });
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn notifications_changed(&self) {
        let unread = self.notifications.unread_count().await;
        self.emit(EngineEvent::NotificationsChanged { unread });
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
