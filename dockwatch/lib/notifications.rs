//! The local notification list.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::models::Notification;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Ordered log of notifications from the backend and from the engine itself.
///
/// Inserts are idempotent on the notification id and nothing is ever removed. The only mutation
/// after insertion is the read flag.
#[derive(Debug, Default)]
pub struct NotificationStore {
    inner: RwLock<NotificationLog>,
}

#[derive(Debug, Default)]
struct NotificationLog {
    /// Most recent first.
    entries: Vec<Notification>,
    ids: HashSet<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl NotificationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a locally created notification. Returns `false` if its id is already present.
    pub async fn add(&self, notification: Notification) -> bool {
        self.inner.write().await.insert(notification)
    }

    /// Merges notifications polled from the backend. Returns how many were new.
    pub async fn merge(&self, remote: Vec<Notification>) -> usize {
        let mut log = self.inner.write().await;
        remote
            .into_iter()
            .map(|n| log.insert(n))
            .filter(|inserted| *inserted)
            .count()
    }

    /// Marks one notification as read. Returns `false` if the id is unknown or it was already read.
    pub async fn mark_read(&self, id: &str) -> bool {
        let mut log = self.inner.write().await;
        match log.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.read => {
                entry.read = true;
                true
            }
            _ => false,
        }
    }

    /// Marks every notification as read. Returns how many changed.
    pub async fn mark_all_read(&self) -> usize {
        let mut log = self.inner.write().await;
        let mut changed = 0;
        for entry in log.entries.iter_mut().filter(|e| !e.read) {
            entry.read = true;
            changed += 1;
        }
        changed
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self) -> usize {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .filter(|e| !e.read)
            .count()
    }

    /// All notifications, most recent first. Equal timestamps list the later insertion first.
    pub async fn list(&self) -> Vec<Notification> {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .cloned()
            .collect()
    }

    /// Unread notifications, most recent first.
    pub async fn unread(&self) -> Vec<Notification> {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .filter(|e| !e.read)
            .cloned()
            .collect()
    }

    /// Number of notifications held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

impl NotificationLog {
    fn insert(&mut self, notification: Notification) -> bool {
        if !self.ids.insert(notification.id.clone()) {
            return false;
        }

        // Lands ahead of existing entries with the same timestamp.
        let position = self
            .entries
            .partition_point(|e| e.created_at > notification.created_at);
        self.entries.insert(position, notification);

        true
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
