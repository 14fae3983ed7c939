//! SQLite storage implementation for Flexfolio.
//!
//! This crate is the only place where Diesel dependencies exist. It
//! implements the repository traits defined in `flexfolio-core`:
//! connection pooling, embedded migrations, a single-writer actor for
//! serialized transactional writes, and the repositories for the trade
//! ledger, reconciled positions, the snapshot cache, and holders.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod holders;
pub mod positions;
pub mod snapshot;
pub mod trades;

mod utils;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool, WriteHandle};

// Re-export storage errors
pub use errors::StorageError;

// Re-export from flexfolio-core for convenience
pub use flexfolio_core::errors::{DatabaseError, Error, Result};
