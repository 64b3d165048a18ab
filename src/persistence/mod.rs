//! Loading and saving namespace snapshots between sessions.

mod snapshot_format;
mod snapshot_store;

pub use snapshot_format::SnapshotFormat;
pub use snapshot_store::{SnapshotStore, SnapshotStoreError, default_state_file};
