//! Storage traits and error types
//!
//! This module defines the trait interface for archive backends and
//! associated error types.

use crate::record::{ArchiveEntry, Provenance};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Malformed archive entry {id}: {message}")]
    Malformed { id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported checkpoint version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Checkpoint checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable per-record archive
///
/// Every write is keyed by the record id and may be repeated: metadata and
/// text are overwritten, provenance is only added once per pair.
pub trait ArchiveStore: Send {
    /// Writes the metadata record of `id`, replacing any previous one
    fn put_meta(&mut self, id: &str, entry: &ArchiveEntry) -> StorageResult<()>;

    /// Notes that `provenance` found `id`
    fn append_found_by(&mut self, id: &str, provenance: &Provenance) -> StorageResult<()>;

    /// Writes the full-text blob of `id`, replacing any previous one
    fn put_text(&mut self, id: &str, text: &str) -> StorageResult<()>;

    /// Reads back an archived entry, text included
    fn load_entry(&self, id: &str) -> StorageResult<Option<ArchiveEntry>>;

    /// Counts archived metadata records
    fn count_entries(&self) -> StorageResult<u64>;
}
