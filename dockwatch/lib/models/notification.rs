use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::deserialize_timestamp;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A newer reference exists for an image.
    ImageUpdate,

    /// A user action succeeded.
    Success,

    /// A user action failed.
    Error,

    /// Anything else.
    Info,
}

/// An entry in the notification log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique id across local and backend-sourced notifications.
    pub id: String,

    /// What the notification is about.
    #[serde(alias = "type")]
    pub kind: NotificationKind,

    /// Short title.
    pub title: String,

    /// Body text.
    pub message: String,

    /// The image tag the notification refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,

    /// When the notification was created.
    #[serde(alias = "timestamp", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,

    /// Whether the user has seen it. The only mutable field.
    #[serde(default)]
    pub read: bool,
}

/// The notifications endpoint's payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationsPayload {
    /// Notifications stored by the backend.
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Notification {
    /// Creates an unread notification with a fresh id, timestamped now.
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            image_tag: None,
            created_at: Utc::now(),
            read: false,
        }
    }

    /// Creates the notification announcing that `tag` has newer references upstream.
    pub fn image_update(tag: &str, candidate_tags: &[String]) -> Self {
        let message = match candidate_tags {
            [] => format!("A newer version of {tag} is available"),
            tags => format!(
                "A newer version of {tag} is available ({} candidate tags, e.g. {})",
                tags.len(),
                tags[..tags.len().min(3)].join(", ")
            ),
        };

        Self::new(NotificationKind::ImageUpdate, "Image update available", message)
            .with_image_tag(tag)
    }

    /// Creates a success notification.
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    /// Creates an error notification.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    /// Attaches an image tag.
    pub fn with_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image_tag = Some(tag.into());
        self
    }

    /// Overrides the creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::ImageUpdate => write!(f, "image_update"),
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Info => write!(f, "info"),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
