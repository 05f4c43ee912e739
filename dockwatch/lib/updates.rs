//! Image update checks and the notifications they raise.

use std::{collections::HashMap, sync::Arc};

use futures::future;
use tokio::sync::RwLock;

use crate::{
    backend::DashboardBackend,
    models::{BackendMode, Image, Notification, UpdateAvailability},
    notifications::NotificationStore,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Checks a bounded prefix of the image list for newer upstream references.
pub struct UpdateChecker {
    backend: Arc<dyn DashboardBackend>,
    notifications: Arc<NotificationStore>,
    ledger: RwLock<UpdateLedger>,
    limit: usize,
}

#[derive(Debug, Default)]
struct UpdateLedger {
    availability: HashMap<String, UpdateAvailability>,
}

/// What one update-check pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePass {
    /// Tags that were queried, in list order.
    pub checked: Vec<String>,

    /// Tags that newly qualified for an update in this pass.
    pub newly_available: Vec<String>,

    /// Tags whose check failed, with the rendered error.
    pub failed: Vec<(String, String)>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl UpdateChecker {
    /// Creates a checker that examines at most `limit` images per pass.
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        notifications: Arc<NotificationStore>,
        limit: usize,
    ) -> Self {
        Self {
            backend,
            notifications,
            ledger: RwLock::new(UpdateLedger::default()),
            limit,
        }
    }

    /// Runs one pass over `images` and returns the availability recorded for every tag checked
    /// so far.
    ///
    /// Nothing is checked in demo mode. Otherwise the first `limit` images are examined, skipping
    /// untagged ones. A tag that newly has an update gets exactly one `image_update`
    /// notification, which is stored on the backend and added locally.
    pub async fn check_for_updates(
        &self,
        images: &[Image],
        mode: BackendMode,
    ) -> HashMap<String, UpdateAvailability> {
        self.run_pass(images, mode).await;
        self.availability().await
    }

    /// Runs one pass and reports what it did.
    pub async fn run_pass(&self, images: &[Image], mode: BackendMode) -> UpdatePass {
        let mut pass = UpdatePass::default();
        if mode == BackendMode::Demo {
            tracing::trace!("skipping update checks in demo mode");
            return pass;
        }

        let tags: Vec<&str> = images
            .iter()
            .take(self.limit)
            .filter(|image| !image.is_untagged())
            .map(|image| image.tag.as_str())
            .collect();

        // Checks run one after the other so the pass never has more than one request in flight.
        for tag in tags {
            pass.checked.push(tag.to_string());

            let check = match self.backend.check_image_update(tag).await {
                Ok(check) if check.is_conclusive() => check,
                Ok(check) => {
                    let reason = check.error.unwrap_or_default();
                    tracing::warn!(%tag, %reason, "update check inconclusive");
                    pass.failed.push((tag.to_string(), reason));
                    continue;
                }
                Err(e) => {
                    tracing::warn!(%tag, error = %e, "update check failed");
                    pass.failed.push((tag.to_string(), e.to_string()));
                    continue;
                }
            };

            if self.record(tag, check.into()).await {
                pass.newly_available.push(tag.to_string());
            }
        }

        if !pass.newly_available.is_empty() {
            self.notify(&pass.newly_available).await;
        }

        tracing::debug!(
            checked = pass.checked.len(),
            new = pass.newly_available.len(),
            failed = pass.failed.len(),
            "update check pass finished"
        );

        pass
    }

    /// Availability recorded so far, by tag.
    pub async fn availability(&self) -> HashMap<String, UpdateAvailability> {
        self.ledger.read().await.availability.clone()
    }

    /// Availability recorded for one tag. `None` means the tag has not been checked yet.
    pub async fn availability_of(&self, tag: &str) -> Option<UpdateAvailability> {
        self.ledger.read().await.availability.get(tag).cloned()
    }

    /// The number of images examined per pass.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records a result and returns whether the tag newly qualifies for an update, i.e. it has one
    /// now and was not already recorded as having one.
    async fn record(&self, tag: &str, result: UpdateAvailability) -> bool {
        let has_update = result.has_update;
        let previous = self
            .ledger
            .write()
            .await
            .availability
            .insert(tag.to_string(), result);

        has_update && !previous.is_some_and(|p| p.has_update)
    }

    async fn notify(&self, tags: &[String]) {
        let notifications: Vec<Notification> = {
            let ledger = self.ledger.read().await;
            tags.iter()
                .map(|tag| {
                    let candidates = ledger
                        .availability
                        .get(tag)
                        .map(|a| a.candidate_tags.as_slice())
                        .unwrap_or_default();
                    Notification::image_update(tag, candidates)
                })
                .collect()
        };

        let posts = notifications
            .iter()
            .map(|notification| self.backend.post_notification(notification));
        for (notification, result) in notifications.iter().zip(future::join_all(posts).await) {
            if let Err(e) = result {
                tracing::warn!(
                    tag = notification.image_tag.as_deref().unwrap_or_default(),
                    error = %e,
                    "failed to store update notification on backend"
                );
            }
        }

        for notification in notifications {
            self.notifications.add(notification).await;
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
