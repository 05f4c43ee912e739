use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The default base URL of the monitoring backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// The default world-state refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// The default notification refresh period.
pub const DEFAULT_NOTIFICATION_INTERVAL: Duration = Duration::from_secs(30);

/// The default period at which the image-set trigger is evaluated.
pub const DEFAULT_UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// The default number of images examined per update-check pass.
pub const DEFAULT_UPDATE_CHECK_LIMIT: usize = 5;

/// The default number of log lines requested for a detail view.
pub const DEFAULT_LOG_TAIL: usize = 100;

/// The default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The default number of retries for a transient request failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
