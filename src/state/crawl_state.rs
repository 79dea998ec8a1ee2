use crate::record::{ArchiveEntry, Provenance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Everything the crawler knows between two calls
///
/// `known_ids` is the dedup barrier: an id enters it only once its record has
/// been persisted, so a failed record is retried by a later search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    pub known_ids: BTreeSet<String>,

    /// Archive the results are mirrored to; `None` keeps them in memory only
    pub archive_path: Option<PathBuf>,

    pub results: BTreeMap<String, ArchiveEntry>,

    /// Hash of the configuration file the crawl was last run with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl CrawlState {
    /// Creates an empty state archiving to `archive_path`
    pub fn new(archive_path: Option<PathBuf>) -> Self {
        Self {
            archive_path,
            ..Self::default()
        }
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.known_ids.contains(id)
    }

    pub fn entry(&self, id: &str) -> Option<&ArchiveEntry> {
        self.results.get(id)
    }

    /// Inserts a freshly persisted entry and marks its id as known
    pub fn insert(&mut self, entry: ArchiveEntry) {
        self.known_ids.insert(entry.id.clone());
        self.results.insert(entry.id.clone(), entry);
    }

    /// Adds `provenance` to the entry of `id`
    ///
    /// Returns true if the entry exists and did not list it yet.
    pub fn add_found_by(&mut self, id: &str, provenance: Provenance) -> bool {
        self.results
            .get_mut(id)
            .map(|entry| entry.add_found_by(provenance))
            .unwrap_or(false)
    }

    pub fn entry_mut(&mut self, id: &str) -> Option<&mut ArchiveEntry> {
        self.results.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
