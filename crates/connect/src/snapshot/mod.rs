//! Snapshot cache service.

mod service;


pub use service::SnapshotCacheService;
