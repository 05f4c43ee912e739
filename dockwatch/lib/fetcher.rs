//! World-state refresh cycles.

use std::sync::Arc;

use crate::{
    backend::DashboardBackend,
    models::{BackendMode, StateSnapshot},
    source::Sources,
    state::{CycleToken, SnapshotStore},
    DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs world-state refresh cycles and publishes their snapshots.
pub struct DataFetcher {
    backend: Arc<dyn DashboardBackend>,
    sources: Sources,
    store: Arc<SnapshotStore>,
}

/// The result of one successful refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The snapshot visible once this cycle finished. Newer than this cycle's own result when
    /// `applied` is `false`.
    pub snapshot: Arc<StateSnapshot>,

    /// Whether the snapshot was published. `false` when a newer cycle was applied first.
    pub applied: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DataFetcher {
    /// Creates a fetcher publishing into `store`.
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        sources: Sources,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            backend,
            sources,
            store,
        }
    }

    /// Runs one refresh cycle.
    ///
    /// The status request goes first. If it reports the unavailability code, the demo dataset
    /// becomes the snapshot and no further calls are made. Otherwise containers and then images
    /// are fetched one after the other. Any failure discards this cycle, records it on the store
    /// and is returned; the previously published snapshot stays visible.
    pub async fn refresh(&self) -> DockwatchResult<RefreshOutcome> {
        let token = self.store.begin_cycle();
        let previous_mode = self.store.current().mode();

        match self.run_cycle(token).await {
            Ok(snapshot) => {
                if snapshot.mode() != previous_mode {
                    tracing::info!(
                        generation = token.generation(),
                        from = %previous_mode,
                        to = %snapshot.mode(),
                        "backend mode changed"
                    );
                }

                let applied = self.store.publish(token, snapshot);
                Ok(RefreshOutcome {
                    snapshot: self.store.current(),
                    applied,
                })
            }
            Err(e) => {
                tracing::debug!(
                    generation = token.generation(),
                    error = %e,
                    "refresh cycle failed"
                );
                self.store.record_failure(token, e.to_string());
                Err(e)
            }
        }
    }

    /// The store this fetcher publishes into.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    async fn run_cycle(&self, token: CycleToken) -> DockwatchResult<StateSnapshot> {
        let status = match self.backend.fetch_status().await {
            Ok(status) => status,
            Err(e) if e.is_backend_unavailable() => {
                tracing::debug!(
                    generation = token.generation(),
                    "backend unavailable, serving demo data"
                );
                return Ok(self.sources.demo_snapshot());
            }
            Err(e) => return Err(e),
        };

        let source = self.sources.select(BackendMode::Live);
        let containers = source.containers().await?;
        let images = source.images().await?;

        Ok(StateSnapshot::new(status, containers, images))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
