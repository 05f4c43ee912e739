//! Live and demo data sources.
//!
//! The status request decides the mode once per cycle. Everything after that goes through the
//! [`DataSource`] picked for the mode, so fetch code never checks the mode itself.

use std::sync::Arc;

use crate::{
    backend::DashboardBackend,
    demo::DemoDataProvider,
    models::{BackendMode, Container, ContainerAction, ContainerStats, Image, StateSnapshot},
    DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Where world-state lists and per-container details come from.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// The mode this source serves.
    fn mode(&self) -> BackendMode;

    /// Lists all containers.
    async fn containers(&self) -> DockwatchResult<Vec<Container>>;

    /// Lists all images.
    async fn images(&self) -> DockwatchResult<Vec<Image>>;

    /// Samples resource usage for one container.
    async fn stats(&self, container_id: &str) -> DockwatchResult<ContainerStats>;

    /// Fetches recent log lines for one container.
    async fn logs(&self, container_id: &str) -> DockwatchResult<String>;

    /// Fetches the deployment descriptor of one container.
    async fn descriptor(&self, container_id: &str) -> DockwatchResult<String>;

    /// Fetches the runtime's low-level attributes of one container.
    async fn inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value>;

    /// Runs a lifecycle action and returns the result message.
    async fn container_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String>;
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Reads from the monitoring backend.
pub struct LiveSource {
    backend: Arc<dyn DashboardBackend>,
    log_tail: usize,
}

/// Serves the fixed demo dataset without touching the network.
#[derive(Debug, Clone)]
pub struct DemoSource {
    provider: DemoDataProvider,
    log_tail: usize,
}

/// Both sources, ready to be selected by mode.
#[derive(Clone)]
pub struct Sources {
    live: Arc<LiveSource>,
    demo: Arc<DemoSource>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LiveSource {
    /// Creates a live source over `backend`.
    pub fn new(backend: Arc<dyn DashboardBackend>, log_tail: usize) -> Self {
        Self { backend, log_tail }
    }
}

impl DemoSource {
    /// Creates a demo source.
    pub fn new(log_tail: usize) -> Self {
        Self {
            provider: DemoDataProvider::new(),
            log_tail,
        }
    }

    /// The demo world state.
    pub fn snapshot(&self) -> StateSnapshot {
        self.provider.snapshot()
    }
}

impl Sources {
    /// Creates both sources.
    pub fn new(backend: Arc<dyn DashboardBackend>, log_tail: usize) -> Self {
        Self {
            live: Arc::new(LiveSource::new(backend, log_tail)),
            demo: Arc::new(DemoSource::new(log_tail)),
        }
    }

    /// The source for `mode`. Only demo mode serves demo data; an unreachable backend is still
    /// asked directly so user-initiated calls report the real failure.
    pub fn select(&self, mode: BackendMode) -> Arc<dyn DataSource> {
        match mode {
            BackendMode::Demo => self.demo.clone(),
            BackendMode::Live | BackendMode::Unreachable => self.live.clone(),
        }
    }

    /// The demo world state.
    pub fn demo_snapshot(&self) -> StateSnapshot {
        self.demo.snapshot()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl DataSource for LiveSource {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn containers(&self) -> DockwatchResult<Vec<Container>> {
        self.backend.fetch_containers().await
    }

    async fn images(&self) -> DockwatchResult<Vec<Image>> {
        self.backend.fetch_images().await
    }

    async fn stats(&self, container_id: &str) -> DockwatchResult<ContainerStats> {
        self.backend.fetch_stats(container_id).await
    }

    async fn logs(&self, container_id: &str) -> DockwatchResult<String> {
        self.backend.fetch_logs(container_id, self.log_tail).await
    }

    async fn descriptor(&self, container_id: &str) -> DockwatchResult<String> {
        self.backend.fetch_descriptor(container_id).await
    }

    async fn inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value> {
        self.backend.fetch_inspect(container_id).await
    }

    async fn container_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String> {
        self.backend.container_action(container_id, action).await
    }
}

#[async_trait::async_trait]
impl DataSource for DemoSource {
    fn mode(&self) -> BackendMode {
        BackendMode::Demo
    }

    async fn containers(&self) -> DockwatchResult<Vec<Container>> {
        Ok(self.provider.containers())
    }

    async fn images(&self) -> DockwatchResult<Vec<Image>> {
        Ok(self.provider.images())
    }

    async fn stats(&self, container_id: &str) -> DockwatchResult<ContainerStats> {
        self.provider.stats(container_id)
    }

    async fn logs(&self, container_id: &str) -> DockwatchResult<String> {
        self.provider.logs(container_id, self.log_tail)
    }

    async fn descriptor(&self, container_id: &str) -> DockwatchResult<String> {
        self.provider.compose(container_id)
    }

    async fn inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value> {
        self.provider.inspect(container_id)
    }

    async fn container_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String> {
        self.provider.action_message(container_id, action)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
