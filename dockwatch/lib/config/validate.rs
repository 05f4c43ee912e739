//! Engine configuration validation

use crate::{DockwatchError, DockwatchResult};

use super::EngineConfig;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EngineConfig {
    /// Checks that the configuration can drive the engine:
    /// - the backend URL parses and uses http or https
    /// - every timer period and the request timeout are non-zero
    /// - at least one image is examined per update-check pass
    ///
    /// All problems are reported together.
    pub fn validate(&self) -> DockwatchResult<()> {
        let mut errors = Vec::new();

        match self.parsed_backend_url() {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "backend url must use http or https, got {:?}",
                url.scheme()
            )),
            Err(e) => errors.push(e.to_string()),
        }

        let periods = [
            ("refresh interval", self.refresh_interval()),
            ("notification interval", self.notification_interval()),
            ("update check interval", self.update_check_interval()),
            ("request timeout", self.request_timeout()),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                errors.push(format!("{name} must be greater than zero"));
            }
        }

        if *self.update_check_limit() == 0 {
            errors.push("update check limit must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DockwatchError::InvalidConfig(errors.join("; ")))
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
