//! Snapshot module - cached open-position and cash rows per holder.

mod snapshot_model;
mod snapshot_traits;

pub use snapshot_model::{CachedPosition, CashBalance, HolderSnapshot, RefreshOutcome};
pub use snapshot_traits::SnapshotRepositoryTrait;
