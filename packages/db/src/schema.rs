//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");
    db.query(UPLOAD_SCHEMA).await?.check()?;
    tracing::info!("Database schema initialized");

    Ok(())
}

/// Upload table schema.
///
/// The record body is the serialized `QueuedUpload` under `upload`; the
/// flattened `status_name` and `created_ms` columns exist for filtering and
/// ordering.
const UPLOAD_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS upload SCHEMALESS;

DEFINE FIELD IF NOT EXISTS status_name ON upload TYPE string;
DEFINE FIELD IF NOT EXISTS created_ms ON upload TYPE int;

DEFINE INDEX IF NOT EXISTS upload_status ON upload FIELDS status_name;
DEFINE INDEX IF NOT EXISTS upload_created ON upload FIELDS created_ms;
"#;
