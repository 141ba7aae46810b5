//! Writer/reader handles over the published snapshot.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::Snapshot;

/// Create a store seeded with `initial`, returning the single writer and a
/// cloneable reader.
pub fn snapshot_store(initial: Snapshot) -> (SnapshotWriter, SnapshotReader) {
    let slot = Arc::new(ArcSwap::from_pointee(initial));
    (
        SnapshotWriter {
            slot: Arc::clone(&slot),
        },
        SnapshotReader { slot },
    )
}

/// The sole mutator of the published snapshot. Not `Clone`.
pub struct SnapshotWriter {
    slot: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotWriter {
    /// The currently published snapshot, used as the base of the next cycle.
    pub fn current(&self) -> Arc<Snapshot> {
        self.slot.load_full()
    }

    /// Atomically replace the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        tracing::debug!(
            records = snapshot.staking_records().len(),
            tokens = snapshot.tokens().len(),
            updated_at = %snapshot.updated_at(),
            "publishing snapshot"
        );
        self.slot.store(Arc::new(snapshot));
    }

    /// A reader over the same slot.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Read-only handle; cheap to clone and share across request handlers.
#[derive(Clone)]
pub struct SnapshotReader {
    slot: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotReader {
    /// Load the current snapshot. Hold on to the returned `Arc` for the
    /// whole request so every read sees the same cycle.
    pub fn load(&self) -> Arc<Snapshot> {
        self.slot.load_full()
    }
}
