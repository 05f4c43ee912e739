//! Container lifecycle actions.

use std::sync::Arc;

use crate::{
    fetcher::{DataFetcher, RefreshOutcome},
    models::{BackendMode, ContainerAction, Notification},
    notifications::NotificationStore,
    source::Sources,
    DockwatchResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs one-shot container lifecycle actions.
pub struct ActionRunner {
    sources: Sources,
    fetcher: Arc<DataFetcher>,
    notifications: Arc<NotificationStore>,
}

/// The result of a successful action.
#[derive(Debug)]
pub struct ActionOutcome {
    /// The result message, from the backend or synthesized in demo mode.
    pub message: String,

    /// Mode the action ran in.
    pub mode: BackendMode,

    /// The follow-up world-state refresh. `None` in demo mode, where no refresh is run.
    pub refresh: Option<DockwatchResult<RefreshOutcome>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ActionRunner {
    /// Creates a runner.
    pub fn new(
        sources: Sources,
        fetcher: Arc<DataFetcher>,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        Self {
            sources,
            fetcher,
            notifications,
        }
    }

    /// Requests `action` on a container.
    ///
    /// In demo mode no backend call is made and a local success notification is added. In live
    /// mode the backend's message becomes a success notification and a world-state refresh
    /// follows, so the dashboard shows the state the backend confirms. A failure adds an error
    /// notification and is returned to the caller.
    pub async fn perform(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> DockwatchResult<ActionOutcome> {
        let mode = self.fetcher.store().current().mode();
        let source = self.sources.select(mode);

        tracing::info!(%container_id, %action, %mode, "running container action");

        let message = match source.container_action(container_id, action).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(%container_id, %action, error = %e, "container action failed");
                self.notifications
                    .add(Notification::error(
                        format!("Failed to {action} container"),
                        e.to_string(),
                    ))
                    .await;
                return Err(e);
            }
        };

        let message = if message.is_empty() {
            format!("Container {container_id} {}", action.past_tense())
        } else {
            message
        };

        self.notifications
            .add(Notification::success(
                format!("Container {}", action.past_tense()),
                message.clone(),
            ))
            .await;

        let refresh = if mode == BackendMode::Demo {
            None
        } else {
            let result = self.fetcher.refresh().await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "refresh after container action failed");
            }
            Some(result)
        };

        Ok(ActionOutcome {
            message,
            mode,
            refresh,
        })
    }
}

impl ActionOutcome {
    /// Whether the follow-up refresh ran and succeeded.
    pub fn refreshed(&self) -> bool {
        matches!(self.refresh, Some(Ok(_)))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
