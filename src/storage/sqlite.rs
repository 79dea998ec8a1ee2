//! SQLite archive implementation
//!
//! This module provides a SQLite-based implementation of the ArchiveStore trait.

use crate::record::{ArchiveEntry, Provenance};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArchiveStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite archive backend
pub struct SqliteArchive {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteArchive {
    /// Opens or creates an archive database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteArchive)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load_found_by(&self, id: &str) -> StorageResult<Vec<Provenance>> {
        let mut stmt = self
            .conn
            .prepare("SELECT provenance FROM found_by WHERE record_id = ?1 ORDER BY seq ASC")?;

        let found_by = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .map(|row| row.map(|p| Provenance::from_archive_string(&p)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(found_by)
    }
}

impl ArchiveStore for SqliteArchive {
    fn put_meta(&mut self, id: &str, entry: &ArchiveEntry) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO records (id, title, authors, citation, full_text_ref, archived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                entry.title,
                entry.authors,
                entry.citation,
                entry.full_text_ref,
                now
            ],
        )?;
        for provenance in &entry.found_by {
            tx.execute(
                "INSERT OR IGNORE INTO found_by (record_id, provenance) VALUES (?1, ?2)",
                params![id, provenance.to_archive_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn append_found_by(&mut self, id: &str, provenance: &Provenance) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO found_by (record_id, provenance) VALUES (?1, ?2)",
            params![id, provenance.to_archive_string()],
        )?;
        Ok(())
    }

    fn put_text(&mut self, id: &str, text: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO texts (record_id, body) VALUES (?1, ?2)",
            params![id, text],
        )?;
        Ok(())
    }

    fn load_entry(&self, id: &str) -> StorageResult<Option<ArchiveEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT r.id, r.title, r.authors, r.citation, r.full_text_ref, t.body
                 FROM records r LEFT JOIN texts t ON t.record_id = r.id
                 WHERE r.id = ?1",
                params![id],
                |row| {
                    Ok(ArchiveEntry {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        authors: row.get(2)?,
                        citation: row.get(3)?,
                        full_text_ref: row.get(4)?,
                        abstract_text: row.get(5)?,
                        found_by: Vec::new(),
                    })
                },
            )
            .optional()?;

        match entry {
            Some(mut entry) => {
                entry.found_by = self.load_found_by(id)?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn count_entries(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
