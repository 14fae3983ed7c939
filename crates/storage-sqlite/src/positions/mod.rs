//! SQLite storage for reconciled positions.

mod model;
mod repository;

pub use model::PositionDB;
pub use repository::PositionRepository;

// Re-export trait from core for convenience
pub use flexfolio_core::positions::PositionRepositoryTrait;
