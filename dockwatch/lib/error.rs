use std::{
    error::Error,
    fmt::{self, Display},
};
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a dockwatch-related operation.
pub type DockwatchResult<T> = Result<T, DockwatchError>;

/// An error that occurred while synchronizing with the monitoring backend.
#[derive(pretty_error_debug::Debug, Error)]
pub enum DockwatchError {
    /// The status request returned the designated unavailability code. The engine answers this by
    /// switching to the demo dataset; it is not a user-visible failure.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Transport {
        /// The endpoint that was called.
        endpoint: String,

        /// The HTTP status code returned.
        status: u16,

        /// The response body or reason phrase.
        message: String,
    },

    /// An error that occurred during an HTTP request.
    #[error("http request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// An error that occurred during an HTTP middleware operation.
    #[error("http middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// A JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML serialization error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested container is not known to the data source.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// The requested container action is not one of start, stop or restart.
    #[error("invalid container action: {0}")]
    InvalidContainerAction(String),

    /// The engine configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start` was called on a scheduler that is already running.
    #[error("scheduler is already running")]
    SchedulerAlreadyRunning,

    /// An error that occurred when a join handle returned an error.
    #[error("join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DockwatchError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> DockwatchError {
        DockwatchError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Whether this error is the status request's unavailability signal.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, DockwatchError::BackendUnavailable(_))
    }

    /// Whether this error is a transport failure: a network error, a non-success status or a
    /// response body that could not be decoded.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DockwatchError::Transport { .. }
                | DockwatchError::HttpRequest(_)
                | DockwatchError::HttpMiddleware(_)
                | DockwatchError::Json(_)
        )
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
