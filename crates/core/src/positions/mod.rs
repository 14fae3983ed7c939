//! Positions module - average-cost reconciliation of the trade ledger.

mod positions_model;
mod positions_traits;
mod reconciler;

#[cfg(test)]
mod reconciler_tests;

pub use positions_model::PositionCalc;
pub use positions_traits::PositionRepositoryTrait;
pub use reconciler::rebuild_positions;
