//! SQLite storage for the per-holder snapshot cache.

mod model;
mod repository;

pub use model::{CashBalanceDB, OpenPositionDB};
pub use repository::SnapshotRepository;

// Re-export trait from core for convenience
pub use flexfolio_core::snapshot::SnapshotRepositoryTrait;
