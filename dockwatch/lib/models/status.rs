use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where the data in the current snapshot came from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// The snapshot was read from the monitoring backend.
    Live,

    /// The backend signalled unavailability and the snapshot is the fixed demo dataset.
    Demo,

    /// No status request has succeeded yet.
    #[default]
    Unreachable,
}

/// Summary of the backend's container runtime, derived from the last status request.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Where this status came from. Never user-set.
    pub mode: BackendMode,

    /// Number of running containers.
    pub containers_running: u32,

    /// Number of paused containers.
    pub containers_paused: u32,

    /// Number of stopped containers.
    pub containers_stopped: u32,

    /// Number of images.
    pub images: u32,

    /// Version label of the container runtime.
    pub server_version: String,

    /// Kernel version of the host, when reported.
    pub kernel_version: Option<String>,

    /// Host architecture, when reported.
    pub architecture: Option<String>,
}

/// The status endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusPayload {
    /// Connection state reported by the backend, usually `connected`.
    #[serde(default)]
    pub status: String,

    /// Number of running containers.
    #[serde(default)]
    pub containers_running: u32,

    /// Number of paused containers.
    #[serde(default)]
    pub containers_paused: u32,

    /// Number of stopped containers.
    #[serde(default)]
    pub containers_stopped: u32,

    /// Number of images.
    #[serde(default)]
    pub images: u32,

    /// Version label of the container runtime.
    #[serde(default = "unknown")]
    pub server_version: String,

    /// Kernel version of the host.
    #[serde(default)]
    pub kernel_version: Option<String>,

    /// Host architecture.
    #[serde(default)]
    pub architecture: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BackendStatus {
    /// Total number of containers the status accounts for.
    pub fn total_containers(&self) -> u32 {
        self.containers_running + self.containers_paused + self.containers_stopped
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn unknown() -> String {
    "unknown".to_string()
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Live => write!(f, "live"),
            BackendMode::Demo => write!(f, "demo"),
            BackendMode::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl From<StatusPayload> for BackendStatus {
    fn from(payload: StatusPayload) -> Self {
        Self {
            mode: BackendMode::Live,
            containers_running: payload.containers_running,
            containers_paused: payload.containers_paused,
            containers_stopped: payload.containers_stopped,
            images: payload.images,
            server_version: payload.server_version,
            kernel_version: payload.kernel_version,
            architecture: payload.architecture,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
