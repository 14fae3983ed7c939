//! SQLite storage for the canonical trade ledger.

mod model;
mod repository;

pub use model::TradeDB;
pub use repository::TradeRepository;

// Re-export trait from core for convenience
pub use flexfolio_core::trades::TradeRepositoryTrait;
