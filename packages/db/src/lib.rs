//! SurrealDB persistence for the upload queue.
//!
//! Upload records are written through on every status change so a restarted
//! server can restore its queue.
//!
//! # Features
//!
//! - `memory` (default): in-memory store, the queue lives as long as the process
//! - `rocksdb`: enables `rocksdb://` endpoints for an on-disk queue

mod connection;
mod schema;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, get_db, init_db};
pub use schema::init_schema;

/// Connect and define the `upload` table.
pub async fn init(config: DbConfig) -> Result<(), DbError> {
    init_db(config).await?;
    init_schema().await?;
    Ok(())
}
