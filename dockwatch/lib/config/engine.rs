use std::time::Duration;

use getset::{Getters, Setters};
use reqwest::Url;
use typed_builder::TypedBuilder;

use crate::{
    utils::{
        parse_env_secs, parse_env_var, BACKEND_URL_ENV_VAR, LOG_TAIL_ENV_VAR, MAX_RETRIES_ENV_VAR,
        NOTIFICATION_SECS_ENV_VAR, REFRESH_SECS_ENV_VAR, REQUEST_TIMEOUT_SECS_ENV_VAR,
        UPDATE_CHECK_LIMIT_ENV_VAR, UPDATE_CHECK_SECS_ENV_VAR,
    },
    DockwatchError, DockwatchResult,
};

use super::{
    DEFAULT_BACKEND_URL, DEFAULT_LOG_TAIL, DEFAULT_MAX_RETRIES, DEFAULT_NOTIFICATION_INTERVAL,
    DEFAULT_REFRESH_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_UPDATE_CHECK_INTERVAL,
    DEFAULT_UPDATE_CHECK_LIMIT,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Settings for the synchronization engine.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Getters, Setters)]
#[getset(get = "pub", set = "pub")]
pub struct EngineConfig {
    /// Base URL of the monitoring backend.
    #[builder(default = DEFAULT_BACKEND_URL.to_string(), setter(into))]
    backend_url: String,

    /// Period of the world-state refresh timer.
    #[builder(default = DEFAULT_REFRESH_INTERVAL)]
    refresh_interval: Duration,

    /// Period of the notification refresh timer.
    #[builder(default = DEFAULT_NOTIFICATION_INTERVAL)]
    notification_interval: Duration,

    /// Period at which the image-set trigger is evaluated.
    #[builder(default = DEFAULT_UPDATE_CHECK_INTERVAL)]
    update_check_interval: Duration,

    /// Number of images examined per update-check pass.
    #[builder(default = DEFAULT_UPDATE_CHECK_LIMIT)]
    update_check_limit: usize,

    /// Number of log lines requested for a detail view.
    #[builder(default = DEFAULT_LOG_TAIL)]
    log_tail: usize,

    /// Timeout of a single backend request.
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    request_timeout: Duration,

    /// Retries of a transient request failure before it is reported.
    #[builder(default = DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EngineConfig {
    /// Builds a configuration from the environment, after loading a `.env` file if one exists.
    /// Unset variables keep their defaults.
    pub fn from_env() -> DockwatchResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded environment file");
        }

        Self::from_current_env()
    }

    /// Builds a configuration from the variables already in the process environment.
    pub fn from_current_env() -> DockwatchResult<Self> {
        let mut config = Self::default();

        if let Some(url) = parse_env_var::<String>(BACKEND_URL_ENV_VAR)? {
            config.backend_url = url;
        }
        if let Some(interval) = parse_env_secs(REFRESH_SECS_ENV_VAR)? {
            config.refresh_interval = interval;
        }
        if let Some(interval) = parse_env_secs(NOTIFICATION_SECS_ENV_VAR)? {
            config.notification_interval = interval;
        }
        if let Some(interval) = parse_env_secs(UPDATE_CHECK_SECS_ENV_VAR)? {
            config.update_check_interval = interval;
        }
        if let Some(limit) = parse_env_var(UPDATE_CHECK_LIMIT_ENV_VAR)? {
            config.update_check_limit = limit;
        }
        if let Some(tail) = parse_env_var(LOG_TAIL_ENV_VAR)? {
            config.log_tail = tail;
        }
        if let Some(timeout) = parse_env_secs(REQUEST_TIMEOUT_SECS_ENV_VAR)? {
            config.request_timeout = timeout;
        }
        if let Some(retries) = parse_env_var(MAX_RETRIES_ENV_VAR)? {
            config.max_retries = retries;
        }

        Ok(config)
    }

    /// The backend URL, parsed.
    pub fn parsed_backend_url(&self) -> DockwatchResult<Url> {
        Url::parse(&self.backend_url).map_err(|e| {
            DockwatchError::InvalidConfig(format!("backend url {:?}: {e}", self.backend_url))
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
