//! Versioned checkpoint files
//!
//! A snapshot is the whole [`CrawlState`] plus a format version, a timestamp
//! and a SHA-256 checksum of the serialized state. Files are written next to
//! their destination first and renamed into place.

use crate::state::CrawlState;
use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable checkpoint of a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub checksum: String,
    #[serde(flatten)]
    pub state: CrawlState,
}

/// Computes the checksum stored alongside a state
pub fn compute_state_checksum(state: &CrawlState) -> StorageResult<String> {
    let bytes = serde_json::to_vec(state)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

impl Snapshot {
    /// Captures `state` as a snapshot taken now
    pub fn from_state(state: CrawlState) -> StorageResult<Self> {
        let checksum = compute_state_checksum(&state)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            checksum,
            state,
        })
    }

    /// Unpacks the state after checking version and checksum
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlState)` - The snapshot is intact
    /// * `Err(StorageError::UnsupportedVersion)` - Written by another format version
    /// * `Err(StorageError::ChecksumMismatch)` - The state was altered after saving
    pub fn into_state(self) -> StorageResult<CrawlState> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let computed = compute_state_checksum(&self.state)?;
        if computed != self.checksum {
            return Err(StorageError::ChecksumMismatch {
                stored: self.checksum,
                computed,
            });
        }

        Ok(self.state)
    }

    /// Writes the snapshot as JSON to `path`
    pub fn write_to(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        tracing::debug!(
            "Checkpoint with {} records written to {}",
            self.state.results.len(),
            path.display()
        );
        Ok(())
    }

    /// Reads a snapshot from `path` without verifying it
    pub fn read_from(path: &Path) -> StorageResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
