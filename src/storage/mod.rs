//! Archive storage for crawled records
//!
//! This module persists records as they are discovered:
//! - one metadata entry per PMID, written once
//! - one text blob (the abstract) per PMID
//! - the list of searches that found each record
//!
//! Two backends implement [`ArchiveStore`]. The backend is picked from the
//! archive path: SQLite database files by extension, a plain directory of
//! `.meta`/`.txt` files otherwise.

mod directory;
mod schema;
mod sqlite;
mod traits;

pub use directory::DirectoryArchive;
pub use sqlite::SqliteArchive;
pub use traits::{ArchiveStore, StorageError, StorageResult};

use std::path::Path;

const SQLITE_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

/// Archive backend selected for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Directory,
    Sqlite,
}

impl ArchiveKind {
    /// Infers the backend from the path extension
    pub fn infer(path: &Path) -> Self {
        let is_database = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SQLITE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

        if is_database {
            ArchiveKind::Sqlite
        } else {
            ArchiveKind::Directory
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveKind::Directory => write!(f, "directory"),
            ArchiveKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Opens (or creates) the archive at `path`
///
/// # Arguments
///
/// * `path` - Archive directory, or SQLite database file
///
/// # Returns
///
/// * `Ok(Box<dyn ArchiveStore>)` - The opened archive
/// * `Err(StorageError)` - The archive could not be created or opened
pub fn open_archive(path: &Path) -> StorageResult<Box<dyn ArchiveStore>> {
    let kind = ArchiveKind::infer(path);
    tracing::debug!("Opening {} archive at {}", kind, path.display());

    match kind {
        ArchiveKind::Sqlite => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Box::new(SqliteArchive::new(path)?))
        }
        ArchiveKind::Directory => Ok(Box::new(DirectoryArchive::new(path)?)),
    }
}
