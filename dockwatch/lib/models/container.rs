use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    utils::{deserialize_optional_timestamp, deserialize_timestamp},
    DockwatchError,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// The container is running.
    Running,

    /// The container has exited.
    Exited,

    /// The container is paused.
    Paused,

    /// Any other runtime state (created, restarting, dead, ...).
    #[serde(other)]
    Other,
}

/// A container as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Full container id. Unique within one snapshot.
    pub id: String,

    /// Container name.
    pub name: String,

    /// Image reference the container was created from.
    pub image: String,

    /// Human readable status text, e.g. `running`.
    #[serde(default)]
    pub status: String,

    /// Lifecycle state.
    pub state: ContainerState,

    /// When the container was created.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,

    /// Uptime label for running containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,

    /// Abbreviated id.
    #[serde(default)]
    pub short_id: String,

    /// Port bindings as reported by the runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<BTreeMap<String, serde_json::Value>>,

    /// Container labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Resource usage sample for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    /// The container the sample belongs to.
    #[serde(default)]
    pub container_id: String,

    /// CPU usage in percent.
    pub cpu_percent: f64,

    /// Memory usage in bytes.
    pub memory_usage: u64,

    /// Memory limit in bytes.
    pub memory_limit: u64,

    /// Memory usage in percent of the limit.
    pub memory_percent: f64,

    /// Bytes received over the network.
    #[serde(default)]
    pub network_rx: u64,

    /// Bytes sent over the network.
    #[serde(default)]
    pub network_tx: u64,

    /// Bytes read from block devices.
    #[serde(default)]
    pub block_read: u64,

    /// Bytes written to block devices.
    #[serde(default)]
    pub block_write: u64,

    /// When the sample was taken.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A one-shot lifecycle request for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAction {
    /// Start a stopped container.
    Start,

    /// Stop a running container.
    Stop,

    /// Restart a container.
    Restart,
}

/// The containers endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContainersPayload {
    /// All containers, running and stopped.
    pub containers: Vec<Container>,
}

/// The container logs endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogsPayload {
    /// The container the logs belong to.
    #[serde(default)]
    pub container_id: String,

    /// The log text.
    pub logs: String,

    /// Number of lines requested.
    #[serde(default)]
    pub tail: Option<usize>,
}

/// The container descriptor endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescriptorPayload {
    /// The container the descriptor belongs to.
    #[serde(default)]
    pub container_id: String,

    /// The deployment descriptor as compose YAML.
    pub compose: String,
}

/// The container inspect endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InspectPayload {
    /// The container the attributes belong to.
    #[serde(default)]
    pub container_id: String,

    /// Low-level runtime attributes, passed through as reported.
    pub inspect: serde_json::Value,
}

/// The container action endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionPayload {
    /// Human readable outcome reported by the backend.
    #[serde(alias = "detail")]
    pub message: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ContainerState {
    /// Parses a runtime state string, mapping anything unknown to [`ContainerState::Other`].
    pub fn from_runtime(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "running" => ContainerState::Running,
            "exited" => ContainerState::Exited,
            "paused" => ContainerState::Paused,
            _ => ContainerState::Other,
        }
    }
}

impl Container {
    /// Whether the container is running.
    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }
}

impl ContainerStats {
    /// Returns the sample with every percent field inside `[0, 100]`.
    pub fn clamped(mut self) -> Self {
        self.cpu_percent = clamp_percent(self.cpu_percent);
        self.memory_percent = clamp_percent(self.memory_percent);
        self
    }

    /// Whether every percent field lies inside `[0, 100]`.
    pub fn is_within_bounds(&self) -> bool {
        (0.0..=100.0).contains(&self.cpu_percent) && (0.0..=100.0).contains(&self.memory_percent)
    }
}

impl ContainerAction {
    /// The action's path segment on the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
        }
    }

    /// Past-tense verb used in notifications.
    pub fn past_tense(&self) -> &'static str {
        match self {
            ContainerAction::Start => "started",
            ContainerAction::Stop => "stopped",
            ContainerAction::Restart => "restarted",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Running => write!(f, "running"),
            ContainerState::Exited => write!(f, "exited"),
            ContainerState::Paused => write!(f, "paused"),
            ContainerState::Other => write!(f, "other"),
        }
    }
}

impl Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContainerAction {
    type Err = DockwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(ContainerAction::Start),
            "stop" => Ok(ContainerAction::Stop),
            "restart" => Ok(ContainerAction::Restart),
            _ => Err(DockwatchError::InvalidContainerAction(s.to_string())),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
