use getset::Getters;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    default_on_request_failure, default_on_request_success, policies::ExponentialBackoff,
    RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use serde::de::DeserializeOwned;

use crate::{
    config::EngineConfig,
    models::{
        ActionPayload, BackendStatus, Container, ContainerAction, ContainerStats,
        ContainersPayload, DescriptorPayload, Image, ImagesPayload, InspectPayload, LogsPayload,
        Notification, NotificationsPayload, StatusPayload, UpdateCheck,
    },
    DockwatchError, DockwatchResult,
};

use super::DashboardBackend;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Path prefix shared by every backend endpoint.
const API_PREFIX: &str = "api";

/// Longest error body quoted back in a transport error.
const MAX_ERROR_BODY_CHARS: usize = 256;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`DashboardBackend`] that talks to the monitoring backend's REST API.
///
/// Requests go through a retry middleware that retries transient failures with exponential
/// backoff, bounded by [`EngineConfig::max_retries`]. A `503 Service Unavailable` is never retried:
/// on the status request it is the signal to switch to demo data and must be seen immediately.
#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct HttpBackend {
    /// The HTTP client used to make requests to the backend.
    client: ClientWithMiddleware,

    /// The backend's base URL.
    base_url: Url,
}

/// Retry strategy that treats `503 Service Unavailable` as final.
struct UnavailableIsFinal;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl HttpBackend {
    /// Creates a backend client from the engine configuration.
    pub fn new(config: &EngineConfig) -> DockwatchResult<Self> {
        let base_url = config.parsed_backend_url()?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(*config.max_retries());
        let client = Client::builder()
            .timeout(*config.request_timeout())
            .build()?;
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                UnavailableIsFinal,
            ))
            .build();

        Ok(Self { client, base_url })
    }

    /// Builds the URL of an endpoint below the API prefix. Each segment is percent-encoded, so
    /// image tags such as `grafana/grafana:10.2.0` stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> DockwatchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DockwatchError::InvalidConfig(format!(
                    "backend url cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(API_PREFIX)
            .extend(segments);

        Ok(url)
    }

    /// Sends a GET request and decodes a JSON body.
    async fn get_json<T>(&self, name: &str, url: Url) -> DockwatchResult<T>
    where
        T: DeserializeOwned,
    {
        tracing::trace!(endpoint = name, %url, "GET");

        let request = self.client.get(url).build()?;
        let response = self.client.execute(request).await?;
        let response = check_response(name, response).await?;

        Ok(response.json::<T>().await?)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Turns a non-success response into a transport error.
async fn check_response(name: &str, response: Response) -> DockwatchResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(DockwatchError::Transport {
        endpoint: name.to_string(),
        status: status.as_u16(),
        message: error_message(status, response).await,
    })
}

/// Extracts a readable message from an error response. The backend reports failures as
/// `{"detail": "..."}`; anything else is quoted as text.
async fn error_message(status: StatusCode, response: Response) -> String {
    let body = response.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(str::to_string));

    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        None => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl RetryableStrategy for UnavailableIsFinal {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status() == StatusCode::SERVICE_UNAVAILABLE => {
                Some(Retryable::Fatal)
            }
            Ok(response) => default_on_request_success(response),
            Err(error) => default_on_request_failure(error),
        }
    }
}

#[async_trait::async_trait]
impl DashboardBackend for HttpBackend {
    async fn fetch_status(&self) -> DockwatchResult<BackendStatus> {
        let url = self.endpoint(&["docker", "status"])?;
        let request = self.client.get(url).build()?;
        let response = self.client.execute(request).await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            let message = error_message(StatusCode::SERVICE_UNAVAILABLE, response).await;
            return Err(DockwatchError::BackendUnavailable(message));
        }

        let response = check_response("status", response).await?;
        let payload = response.json::<StatusPayload>().await?;

        Ok(payload.into())
    }

    async fn fetch_containers(&self) -> DockwatchResult<Vec<Container>> {
        let url = self.endpoint(&["containers"])?;
        let payload: ContainersPayload = self.get_json("containers", url).await?;
        Ok(payload.containers)
    }

    async fn fetch_images(&self) -> DockwatchResult<Vec<Image>> {
        let url = self.endpoint(&["images"])?;
        let payload: ImagesPayload = self.get_json("images", url).await?;
        Ok(payload.images)
    }

    async fn fetch_stats(&self, container_id: &str) -> DockwatchResult<ContainerStats> {
        let url = self.endpoint(&["containers", container_id, "stats"])?;
        self.get_json("container-stats", url).await
    }

    async fn fetch_logs(&self, container_id: &str, tail: usize) -> DockwatchResult<String> {
        let mut url = self.endpoint(&["containers", container_id, "logs"])?;
        url.query_pairs_mut()
            .append_pair("tail", &tail.to_string());

        let payload: LogsPayload = self.get_json("container-logs", url).await?;
        Ok(payload.logs)
    }

    async fn fetch_descriptor(&self, container_id: &str) -> DockwatchResult<String> {
        let url = self.endpoint(&["containers", container_id, "compose"])?;
        let payload: DescriptorPayload = self.get_json("container-descriptor", url).await?;
        Ok(payload.compose)
    }

    async fn fetch_inspect(&self, container_id: &str) -> DockwatchResult<serde_json::Value> {
        let url = self.endpoint(&["containers", container_id, "inspect"])?;
        let payload: InspectPayload = self.get_json("container-inspect", url).await?;
        Ok(payload.inspect)
    }

    async fn check_image_update(&self, tag: &str) -> DockwatchResult<UpdateCheck> {
        let url = self.endpoint(&["images", tag, "check-updates"])?;
        self.get_json("image-update-check", url).await
    }

    async fn fetch_notifications(&self) -> DockwatchResult<Vec<Notification>> {
        let url = self.endpoint(&["notifications"])?;
        let payload: NotificationsPayload = self.get_json("notifications", url).await?;
        Ok(payload.notifications)
    }

    async fn post_notification(&self, notification: &Notification) -> DockwatchResult<()> {
        let url = self.endpoint(&["notifications"])?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(notification)?)
            .build()?;

        let response = self.client.execute(request).await?;
        check_response("notification", response).await?;

        Ok(())
    }

    async fn container_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<String> {
        let url = self.endpoint(&["containers", container_id, action.as_str()])?;
        let request = self.client.post(url).build()?;
        let response = self.client.execute(request).await?;
        let response = check_response("container-action", response).await?;

        let body = response.text().await?;
        let message = match serde_json::from_str::<ActionPayload>(&body) {
            Ok(payload) => payload.message,
            Err(_) => body.trim().to_string(),
        };

        Ok(message)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
