use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BackendMode, BackendStatus, Container, Image};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The atomic bundle of status, containers and images produced by one refresh cycle.
///
/// Snapshots are immutable once published. Readers hold them behind an `Arc` and a new cycle
/// replaces the whole value rather than patching it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    /// Generation of the refresh cycle that produced this snapshot. `0` is the initial snapshot.
    pub(crate) generation: u64,

    /// Backend status from this cycle.
    pub status: BackendStatus,

    /// Containers from this cycle, in backend order, unique by id.
    pub containers: Vec<Container>,

    /// Images from this cycle, in backend order, unique by tag.
    pub images: Vec<Image>,

    /// When the cycle completed.
    pub fetched_at: DateTime<Utc>,
}

/// Identity of an image list, used to detect that the list changed between cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageSetKey {
    mode: BackendMode,
    entries: Vec<(String, String)>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl StateSnapshot {
    /// The snapshot visible before any cycle has succeeded.
    pub fn initial() -> Self {
        Self {
            generation: 0,
            status: BackendStatus::default(),
            containers: Vec::new(),
            images: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Assembles a snapshot, dropping later duplicates of a container id or image tag.
    pub fn new(status: BackendStatus, containers: Vec<Container>, images: Vec<Image>) -> Self {
        let mut seen = HashSet::new();
        let container_count = containers.len();
        let containers: Vec<Container> = containers
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();

        if containers.len() != container_count {
            tracing::warn!(
                dropped = container_count - containers.len(),
                "dropped containers with duplicate ids"
            );
        }

        let mut seen = HashSet::new();
        let image_count = images.len();
        let images: Vec<Image> = images
            .into_iter()
            .filter(|i| seen.insert(i.tag.clone()))
            .collect();

        if images.len() != image_count {
            tracing::debug!(
                dropped = image_count - images.len(),
                "collapsed images with duplicate tags"
            );
        }

        Self {
            generation: 0,
            status,
            containers,
            images,
            fetched_at: Utc::now(),
        }
    }

    /// Generation of the cycle that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mode of the backend status in this snapshot.
    pub fn mode(&self) -> BackendMode {
        self.status.mode
    }

    /// Whether this is the placeholder published before the first successful cycle.
    pub fn is_initial(&self) -> bool {
        self.generation == 0
    }

    /// Looks up a container by id.
    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    /// Identity of this snapshot's image list.
    pub fn image_set_key(&self) -> ImageSetKey {
        ImageSetKey {
            mode: self.status.mode,
            entries: self
                .images
                .iter()
                .map(|i| (i.tag.clone(), i.id.clone()))
                .collect(),
        }
    }

    /// Whether container ids and image tags are unique.
    pub fn has_unique_keys(&self) -> bool {
        let ids: HashSet<_> = self.containers.iter().map(|c| &c.id).collect();
        let tags: HashSet<_> = self.images.iter().map(|i| &i.tag).collect();
        ids.len() == self.containers.len() && tags.len() == self.images.len()
    }

    /// Whether the snapshot has the same status, containers and images as `other`, ignoring
    /// generation and fetch time.
    pub fn same_contents(&self, other: &StateSnapshot) -> bool {
        self.status == other.status
            && self.containers == other.containers
            && self.images == other.images
    }
}

impl ImageSetKey {
    /// Whether the image list was empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
