//! Flexfolio Connect - orchestration over the core traits.
//!
//! Two services live here: the snapshot cache (stale-while-revalidate reads
//! with single-flight background refresh) and the portfolio pipeline
//! (fetch, parse, normalize, reconcile, assemble).

pub mod portfolio;
pub mod snapshot;

pub use portfolio::PortfolioService;
pub use snapshot::SnapshotCacheService;
