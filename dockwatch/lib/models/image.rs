use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::deserialize_timestamp;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The tag the runtime reports for images without a repository tag.
pub const UNTAGGED_IMAGE_TAG: &str = "<none>:<none>";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An image as listed by the backend. An image with several tags is listed once per tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Full image id.
    pub id: String,

    /// Abbreviated id.
    #[serde(default)]
    pub short_id: String,

    /// `repo:tag` reference. Key for update checks and notification correlation.
    pub tag: String,

    /// When the image was built.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created: DateTime<Utc>,

    /// Size in bytes.
    pub size: u64,

    /// Size in bytes including shared layers.
    #[serde(default)]
    pub virtual_size: u64,

    /// Target architecture.
    #[serde(default)]
    pub architecture: String,

    /// Image labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// The images endpoint's payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImagesPayload {
    /// All images, one entry per tag.
    pub images: Vec<Image>,
}

/// The image update-check endpoint's payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpdateCheck {
    /// The image reference that was checked.
    #[serde(default)]
    pub image: String,

    /// Candidate tags found upstream.
    #[serde(default)]
    pub available_tags: Vec<String>,

    /// Whether a newer reference exists upstream.
    #[serde(default)]
    pub has_updates: bool,

    /// Registry that was queried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Set when the backend could not complete the check. The check is then inconclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Recorded outcome of an update check for one image tag. An absent entry means the tag has not
/// been checked yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAvailability {
    /// Whether a newer reference exists upstream.
    pub has_update: bool,

    /// Candidate tags found upstream.
    pub candidate_tags: Vec<String>,

    /// When the check completed.
    pub checked_at: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Image {
    /// Whether the image has no repository tag.
    pub fn is_untagged(&self) -> bool {
        self.tag == UNTAGGED_IMAGE_TAG
    }
}

impl UpdateCheck {
    /// Whether the backend completed the check.
    pub fn is_conclusive(&self) -> bool {
        self.error.is_none()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<UpdateCheck> for UpdateAvailability {
    fn from(check: UpdateCheck) -> Self {
        Self {
            has_update: check.has_updates,
            candidate_tags: check.available_tags,
            checked_at: Utc::now(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
