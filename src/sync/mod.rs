//! Keeping a screen's task list in step with the remote collection.

pub mod group;
pub mod scope;
pub mod watcher;

pub use group::group_by_date;
pub use scope::{LifetimeToken, Scope};
pub use watcher::{SnapshotInbox, WatchError, WatchGuard, open, snapshot_channel, tasks_from_snapshot};
