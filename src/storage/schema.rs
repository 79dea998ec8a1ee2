//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SQLite archive.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One metadata record per article
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    authors TEXT NOT NULL,
    citation TEXT NOT NULL,
    full_text_ref TEXT,
    archived_at TEXT NOT NULL
);

-- Full-text blobs (abstracts)
CREATE TABLE IF NOT EXISTS texts (
    record_id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);

-- Which searches found which record, in discovery order
CREATE TABLE IF NOT EXISTS found_by (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id TEXT NOT NULL,
    provenance TEXT NOT NULL,
    UNIQUE(record_id, provenance)
);

CREATE INDEX IF NOT EXISTS idx_found_by_record ON found_by(record_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
