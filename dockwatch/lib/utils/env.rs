use std::{env, str::FromStr, time::Duration};

use crate::{DockwatchError, DockwatchResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable for the monitoring backend's base URL.
pub const BACKEND_URL_ENV_VAR: &str = "DOCKWATCH_BACKEND_URL";

/// Environment variable for the world-state refresh period, in seconds.
pub const REFRESH_SECS_ENV_VAR: &str = "DOCKWATCH_REFRESH_SECS";

/// Environment variable for the notification refresh period, in seconds.
pub const NOTIFICATION_SECS_ENV_VAR: &str = "DOCKWATCH_NOTIFICATION_SECS";

/// Environment variable for the update-check trigger period, in seconds.
pub const UPDATE_CHECK_SECS_ENV_VAR: &str = "DOCKWATCH_UPDATE_CHECK_SECS";

/// Environment variable for the number of images examined per update-check pass.
pub const UPDATE_CHECK_LIMIT_ENV_VAR: &str = "DOCKWATCH_UPDATE_CHECK_LIMIT";

/// Environment variable for the number of log lines requested per detail view.
pub const LOG_TAIL_ENV_VAR: &str = "DOCKWATCH_LOG_TAIL";

/// Environment variable for the per-request timeout, in seconds.
pub const REQUEST_TIMEOUT_SECS_ENV_VAR: &str = "DOCKWATCH_REQUEST_TIMEOUT_SECS";

/// Environment variable for the bounded number of transient retries per request.
pub const MAX_RETRIES_ENV_VAR: &str = "DOCKWATCH_MAX_RETRIES";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Reads and parses an environment variable. Returns `Ok(None)` if it is unset.
pub fn parse_env_var<T>(name: &str) -> DockwatchResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            DockwatchError::InvalidConfig(format!("{name}={raw:?} could not be parsed: {e}"))
        }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(DockwatchError::InvalidConfig(format!("{name}: {e}"))),
    }
}

/// Reads an environment variable holding a whole number of seconds.
pub fn parse_env_secs(name: &str) -> DockwatchResult<Option<Duration>> {
    Ok(parse_env_var::<u64>(name)?.map(Duration::from_secs))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
