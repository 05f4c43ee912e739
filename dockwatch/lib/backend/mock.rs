//! In-memory backend used by unit tests.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    demo::DemoDataProvider,
    models::{
        BackendMode, BackendStatus, Container, ContainerAction, ContainerStats, Image,
        Notification, UpdateCheck,
    },
    DockwatchError, DockwatchResult,
};

use super::DashboardBackend;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A scripted reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    /// The designated unavailability code.
    Unavailable,
    /// A non-success status.
    Fail(u16),
}

/// A [`DashboardBackend`] with scripted replies, artificial delays and call recording.
#[derive(Debug)]
pub(crate) struct FakeBackend {
    status: Mutex<Reply<BackendStatus>>,
    containers: Mutex<Reply<Vec<Container>>>,
    images: Mutex<Reply<Vec<Image>>>,
    stats: Mutex<Reply<()>>,
    logs: Mutex<Reply<String>>,
    descriptor: Mutex<Reply<String>>,
    inspect: Mutex<Reply<()>>,
    updates: Mutex<HashMap<String, Reply<UpdateCheck>>>,
    notifications: Mutex<Reply<Vec<Notification>>>,
    post_notification: Mutex<Reply<()>>,
    action: Mutex<Reply<String>>,
    status_delays: Mutex<Vec<Duration>>,
    detail_delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
    posted: Mutex<Vec<Notification>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FakeBackend {
    /// A live backend serving the demo containers and images.
    pub(crate) fn new() -> Self {
        let demo = DemoDataProvider::new();

        Self {
            status: Mutex::new(Reply::Ok(Self::live_status())),
            containers: Mutex::new(Reply::Ok(demo.containers())),
            images: Mutex::new(Reply::Ok(demo.images())),
            stats: Mutex::new(Reply::Ok(())),
            logs: Mutex::new(Reply::Ok("line one\nline two".to_string())),
            descriptor: Mutex::new(Reply::Ok("services: {}\n".to_string())),
            inspect: Mutex::new(Reply::Ok(())),
            updates: Mutex::new(HashMap::new()),
            notifications: Mutex::new(Reply::Ok(Vec::new())),
            post_notification: Mutex::new(Reply::Ok(())),
            action: Mutex::new(Reply::Ok("ok".to_string())),
            status_delays: Mutex::new(Vec::new()),
            detail_delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
        }
    }

    /// The status served by default.
    pub(crate) fn live_status() -> BackendStatus {
        BackendStatus {
            mode: BackendMode::Live,
            server_version: "24.0.7".to_string(),
            ..DemoDataProvider::new().status()
        }
    }

    /// The images served by default.
    pub(crate) fn live_images() -> Vec<Image> {
        DemoDataProvider::new().images()
    }

    pub(crate) fn set_status(&self, reply: Reply<BackendStatus>) {
        *lock(&self.status) = reply;
    }

    pub(crate) fn set_containers(&self, reply: Reply<Vec<Container>>) {
        *lock(&self.containers) = reply;
    }

    pub(crate) fn set_images(&self, reply: Reply<Vec<Image>>) {
        *lock(&self.images) = reply;
    }

    pub(crate) fn set_stats(&self, reply: Reply<()>) {
        *lock(&self.stats) = reply;
    }

    pub(crate) fn set_logs(&self, reply: Reply<String>) {
        *lock(&self.logs) = reply;
    }

    pub(crate) fn set_descriptor(&self, reply: Reply<String>) {
        *lock(&self.descriptor) = reply;
    }

    pub(crate) fn set_inspect(&self, reply: Reply<()>) {
        *lock(&self.inspect) = reply;
    }

    pub(crate) fn set_update(&self, tag: &str, reply: Reply<UpdateCheck>) {
        lock(&self.updates).insert(tag.to_string(), reply);
    }

    pub(crate) fn set_notifications(&self, reply: Reply<Vec<Notification>>) {
        *lock(&self.notifications) = reply;
    }

    pub(crate) fn set_post_notification(&self, reply: Reply<()>) {
        *lock(&self.post_notification) = reply;
    }

    pub(crate) fn set_action(&self, reply: Reply<String>) {
        *lock(&self.action) = reply;
    }

    /// Delays the next status requests, one entry per request, in order.
    pub(crate) fn push_status_delay(&self, delay: Duration) {
        lock(&self.status_delays).push(delay);
    }

    /// Delays every detail fetch for one container.
    pub(crate) fn set_detail_delay(&self, container_id: &str, delay: Duration) {
        lock(&self.detail_delays).insert(container_id.to_string(), delay);
    }

    /// Every call made so far, e.g. `status`, `stats:<id>`, `update:<tag>`.
    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Number of calls whose name starts with `prefix`.
    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub(crate) fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Notifications stored through `post_notification`.
    pub(crate) fn posted(&self) -> Vec<Notification> {
        lock(&self.posted).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }

    async fn detail_delay(&self, container_id: &str) {
        let delay = lock(&self.detail_delays).get(container_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl<T: Clone> Reply<T> {
    fn resolve(&self, endpoint: &str) -> DockwatchResult<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Unavailable => Err(DockwatchError::Transport {
                endpoint: endpoint.to_string(),
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
            Reply::Fail(status) => Err(DockwatchError::Transport {
                endpoint: endpoint.to_string(),
                status: *status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl DashboardBackend for FakeBackend {
    async fn fetch_status(&self) -> DockwatchResult<BackendStatus> {
        self.record("status".to_string());

        let delay = {
            let mut delays = lock(&self.status_delays);
            (!delays.is_empty()).then(|| delays.remove(0))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.status).clone();
        match reply {
            Reply::Unavailable => Err(DockwatchError::BackendUnavailable(
                "Service Unavailable".to_string(),
            )),
            other => other.resolve("status"),
        }
    }

    async fn fetch_containers(&self) -> DockwatchResult<Vec<Container>> {
        self.record("containers".to_string());
        lock(&self.containers).resolve("containers")
    }

    async fn fetch_images(&self) -> DockwatchResult<Vec<Image>> {
        self.record("images".to_string());
        lock(&self.images).resolve("images")
    }

    async fn fetch_stats(&self, container_id: &str) -> DockwatchResult<ContainerStats> {
        self.record(format!("stats:{container_id}"));
        self.detail_delay(container_id).await;
        let reply = lock(&self.stats).clone();
        reply.resolve("container-stats")?;

        Ok(ContainerStats {
            container_id: container_id.to_string(),
            cpu_percent: 12.5,
            memory_usage: 256 * 1024 * 1024,
            memory_limit: 1024 * 1024 * 1024,
            memory_percent: 25.0,
            network_rx: 1024,
            network_tx: 2048,
            block_read: 0,
            block_write: 0,
            timestamp: chrono::Utc::now(),
        })
    }

    async fn fetch_logs(&self, container_id: &str, tail: usize) -> DockwatchResult<String> {
        self.record(format!("logs:{container_id}:{tail}"));
        self.detail_delay(container_id).await;
        let reply = lock(&self.logs).clone();
        let logs = reply.resolve("container-logs")?;
        Ok(format!("[{container_id}]\n{logs}"))
    }

    async fn fetch_descriptor(&self, container_id: &str) -> DockwatchResult<String> {
        self.record(format!("descriptor:{container_id}"));
        self.detail_delay(container_id).await;
        let reply = lock(&self.descriptor).clone();
        let descriptor = reply.resolve("container-descriptor")?;
        Ok(format!("# {container_id}\n{descriptor}"))
    }

    async fn fetch_inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value> {
        self.record(format!("inspect:{container_id}"));
        self.detail_delay(container_id).await;
        let reply = lock(&self.inspect).clone();
        reply.resolve("container-inspect")?;

        Ok(serde_json::json!({
            "Id": container_id,
            "State": { "Status": "running", "Running": true },
        }))
    }

    async fn check_image_update(&self, tag: &str) -> DockwatchResult<UpdateCheck> {
        self.record(format!("update:{tag}"));
        let reply = lock(&self.updates).get(tag).cloned();
        match reply {
            Some(reply) => reply.resolve("image-update-check"),
            None => Ok(UpdateCheck {
                image: tag.to_string(),
                ..Default::default()
            }),
        }
    }

    async fn fetch_notifications(&self) -> DockwatchResult<Vec<Notification>> {
        self.record("notifications".to_string());
        lock(&self.notifications).resolve("notifications")
    }

    async fn post_notification(&self, notification: &Notification) -> DockwatchResult<()> {
        self.record("post-notification".to_string());
        lock(&self.post_notification).resolve("notification")?;
        lock(&self.posted).push(notification.clone());
        Ok(())
    }

    async fn container_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String> {
        self.record(format!("action:{container_id}:{action}"));
        lock(&self.action).resolve("container-action")
    }
}
