//! In-memory snapshot store.
//!
//! Exactly one [`Snapshot`] is published at a time. The refresh task holds
//! the only [`SnapshotWriter`]; request handlers hold cloned
//! [`SnapshotReader`]s and load an `Arc<Snapshot>` once per request.
//! Publishing swaps the reference atomically, so readers see either the old
//! or the new snapshot, never a mix.

pub mod snapshot;
pub mod store;

pub use snapshot::Snapshot;
pub use store::{snapshot_store, SnapshotReader, SnapshotWriter};
