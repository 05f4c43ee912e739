//! On-demand detail for a single selected container.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    models::{BackendMode, ContainerStats},
    source::Sources,
    state::SnapshotStore,
    DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One field of a container detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DetailField<T> {
    /// The fetch has not completed.
    Loading,

    /// The fetch succeeded.
    Ready(T),

    /// The fetch failed. Sibling fields are unaffected.
    Failed(String),
}

/// Stats, logs, deployment descriptor and runtime attributes of the selected container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerDetail {
    /// The selected container.
    pub container_id: String,

    /// Mode the fields were fetched in.
    pub mode: BackendMode,

    /// Resource usage sample.
    pub stats: DetailField<ContainerStats>,

    /// Recent log lines.
    pub logs: DetailField<String>,

    /// Deployment descriptor.
    pub descriptor: DetailField<String>,

    /// Low-level runtime attributes.
    pub inspect: DetailField<serde_json::Value>,

    /// When the container was selected.
    pub opened_at: DateTime<Utc>,

    #[serde(skip)]
    selection: u64,
}

/// Fetches detail for one selected container, on demand and independent of the polling loops.
///
/// Each selection replaces the previous one as a whole. Results of a fetch that completes after a
/// newer selection are dropped.
pub struct DetailAggregator {
    sources: Sources,
    store: Arc<SnapshotStore>,
    selection: AtomicU64,
    current: RwLock<Option<ContainerDetail>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<T> DetailField<T> {
    /// The value, if the fetch succeeded.
    pub fn value(&self) -> Option<&T> {
        match self {
            DetailField::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The error, if the fetch failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            DetailField::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the fetch succeeded.
    pub fn is_ready(&self) -> bool {
        matches!(self, DetailField::Ready(_))
    }

    /// Whether the fetch failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, DetailField::Failed(_))
    }
}

impl ContainerDetail {
    fn loading(container_id: &str, mode: BackendMode, selection: u64) -> Self {
        Self {
            container_id: container_id.to_string(),
            mode,
            stats: DetailField::Loading,
            logs: DetailField::Loading,
            descriptor: DetailField::Loading,
            inspect: DetailField::Loading,
            opened_at: Utc::now(),
            selection,
        }
    }

    /// Whether every field has either loaded or failed.
    pub fn is_settled(&self) -> bool {
        !matches!(self.stats, DetailField::Loading)
            && !matches!(self.logs, DetailField::Loading)
            && !matches!(self.descriptor, DetailField::Loading)
            && !matches!(self.inspect, DetailField::Loading)
    }
}

impl DetailAggregator {
    /// Creates an aggregator with nothing selected.
    pub fn new(sources: Sources, store: Arc<SnapshotStore>) -> Self {
        Self {
            sources,
            store,
            selection: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Selects a container and fetches its stats, logs, descriptor and attributes concurrently.
    ///
    /// Prior detail state is cleared before any fetch starts. Each field fails on its own, so a
    /// failed logs fetch still leaves stats and descriptor populated.
    pub async fn open_detail(&self, container_id: &str) -> ContainerDetail {
        let selection = self.selection.fetch_add(1, Ordering::SeqCst) + 1;
        let mode = self.store.current().mode();
        let mut detail = ContainerDetail::loading(container_id, mode, selection);

        *self.current.write().await = Some(detail.clone());

        let source = self.sources.select(mode);
        let (stats, logs, descriptor, inspect) = tokio::join!(
            source.stats(container_id),
            source.logs(container_id),
            source.descriptor(container_id),
            source.inspect(container_id),
        );

        detail.stats = field(container_id, "stats", stats);
        detail.logs = field(container_id, "logs", logs);
        detail.descriptor = field(container_id, "descriptor", descriptor);
        detail.inspect = field(container_id, "inspect", inspect);

        let mut current = self.current.write().await;
        if self.selection.load(Ordering::SeqCst) == selection {
            *current = Some(detail.clone());
        } else {
            tracing::debug!(%container_id, "discarding detail for a superseded selection");
        }

        detail
    }

    /// Re-fetches stats for the current selection. Returns `None` if nothing is selected or the
    /// selection changed while fetching.
    pub async fn refresh_stats(&self) -> Option<DetailField<ContainerStats>> {
        let (container_id, selection) = {
            let current = self.current.read().await;
            let detail = current.as_ref()?;
            (detail.container_id.clone(), detail.selection)
        };

        let mode = self.store.current().mode();
        let stats = field(
            &container_id,
            "stats",
            self.sources.select(mode).stats(&container_id).await,
        );

        let mut current = self.current.write().await;
        match current.as_mut() {
            Some(detail) if detail.selection == selection => {
                detail.stats = stats.clone();
                detail.mode = mode;
                Some(stats)
            }
            _ => None,
        }
    }

    /// Clears the selection. Fetches still in flight are dropped when they complete.
    pub async fn close_detail(&self) {
        self.selection.fetch_add(1, Ordering::SeqCst);
        *self.current.write().await = None;
    }

    /// The detail of the current selection, possibly still loading.
    pub async fn current_detail(&self) -> Option<ContainerDetail> {
        self.current.read().await.clone()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn field<T>(container_id: &str, name: &str, result: DockwatchResult<T>) -> DetailField<T> {
    match result {
        Ok(value) => DetailField::Ready(value),
        Err(e) => {
            tracing::warn!(%container_id, field = name, error = %e, "detail fetch failed");
            DetailField::Failed(e.to_string())
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
