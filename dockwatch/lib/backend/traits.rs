use crate::{
    models::{
        BackendStatus, Container, ContainerAction, ContainerStats, Image, Notification,
        UpdateCheck,
    },
    DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The endpoints the engine consumes from the monitoring backend.
///
/// Only [`fetch_status`](DashboardBackend::fetch_status) may report
/// [`DockwatchError::BackendUnavailable`](crate::DockwatchError::BackendUnavailable); every other
/// failure is a transport error.
#[async_trait::async_trait]
pub trait DashboardBackend: Send + Sync {
    /// Requests the backend status.
    async fn fetch_status(&self) -> DockwatchResult<BackendStatus>;

    /// Lists all containers.
    async fn fetch_containers(&self) -> DockwatchResult<Vec<Container>>;

    /// Lists all images.
    async fn fetch_images(&self) -> DockwatchResult<Vec<Image>>;

    /// Samples resource usage for one container.
    async fn fetch_stats(&self, container_id: &str) -> DockwatchResult<ContainerStats>;

    /// Fetches the last `tail` log lines of one container.
    async fn fetch_logs(&self, container_id: &str, tail: usize) -> DockwatchResult<String>;

    /// Fetches the deployment descriptor of one container.
    async fn fetch_descriptor(&self, container_id: &str) -> DockwatchResult<String>;

    /// Fetches the runtime's low-level attributes of one container.
    async fn fetch_inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value>;

    /// Asks whether a newer reference exists for an image tag.
    async fn check_image_update(&self, tag: &str) -> DockwatchResult<UpdateCheck>;

    /// Lists notifications stored by the backend.
    async fn fetch_notifications(&self) -> DockwatchResult<Vec<Notification>>;

    /// Stores a notification on the backend.
    async fn post_notification(&self, notification: &Notification) -> DockwatchResult<()>;

    /// Requests a lifecycle action and returns the backend's result message.
    async fn container_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String>;
}
