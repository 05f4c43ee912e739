//! The shared world-state container.
//!
//! [`SnapshotStore`] has a single writer (the fetcher) and any number of readers. Readers hold an
//! `Arc<StateSnapshot>` and are never affected by later cycles; publishing swaps the whole value.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::StateSnapshot;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Generation token taken by a refresh cycle before its first network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleToken(u64);

/// The most recent refresh cycle that failed after the current snapshot was published.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleFailure {
    /// Generation of the failed cycle.
    pub generation: u64,

    /// Rendered error.
    pub message: String,

    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

/// Single-writer, multi-reader holder of the current [`StateSnapshot`].
#[derive(Debug)]
pub struct SnapshotStore {
    snapshot: watch::Sender<Arc<StateSnapshot>>,
    failure: watch::Sender<Option<CycleFailure>>,
    next_generation: AtomicU64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CycleToken {
    /// The generation number.
    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl SnapshotStore {
    /// Creates a store holding [`StateSnapshot::initial`].
    pub fn new() -> Self {
        Self {
            snapshot: watch::Sender::new(Arc::new(StateSnapshot::initial())),
            failure: watch::Sender::new(None),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Takes the next generation token. Tokens are strictly increasing.
    pub fn begin_cycle(&self) -> CycleToken {
        CycleToken(self.next_generation.fetch_add(1, Ordering::SeqCst))
    }

    /// Publishes `snapshot` for the cycle holding `token`.
    ///
    /// The snapshot is applied only if the token is newer than the generation currently
    /// published; a cycle that completes after a newer one was applied is discarded. Returns
    /// whether the snapshot was applied.
    pub fn publish(&self, token: CycleToken, mut snapshot: StateSnapshot) -> bool {
        snapshot.generation = token.0;
        let snapshot = Arc::new(snapshot);

        let applied = self.snapshot.send_if_modified(|current| {
            if token.0 <= current.generation {
                return false;
            }

            *current = snapshot;
            true
        });

        if applied {
            self.failure.send_if_modified(|failure| match failure {
                Some(f) if f.generation < token.0 => {
                    *failure = None;
                    true
                }
                _ => false,
            });
        } else {
            tracing::debug!(generation = token.0, "discarded stale snapshot");
        }

        applied
    }

    /// Records that the cycle holding `token` failed. The published snapshot is left untouched.
    /// A failure older than the current snapshot or the last recorded failure is ignored.
    pub fn record_failure(&self, token: CycleToken, message: impl Into<String>) {
        let current = self.snapshot.borrow().generation;
        if token.0 <= current {
            return;
        }

        let failure = CycleFailure {
            generation: token.0,
            message: message.into(),
            at: Utc::now(),
        };

        self.failure.send_if_modified(|slot| match slot {
            Some(existing) if existing.generation > failure.generation => false,
            _ => {
                *slot = Some(failure);
                true
            }
        });
    }

    /// The currently published snapshot.
    pub fn current(&self) -> Arc<StateSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Subscribes to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Whether any cycle has succeeded.
    pub fn has_loaded(&self) -> bool {
        !self.snapshot.borrow().is_initial()
    }

    /// The most recent failure newer than the published snapshot, if any.
    pub fn last_failure(&self) -> Option<CycleFailure> {
        self.failure.borrow().clone()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
