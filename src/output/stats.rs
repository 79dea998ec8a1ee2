//! Statistics over a saved crawl
//!
//! This module computes and prints summary counts for a checkpoint, and
//! prints the report of a single crawl call.

use crate::crawler::CrawlReport;
use crate::state::{CrawlState, Snapshot};
use crate::storage::StorageResult;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Checkpoint statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointStatistics {
    /// When the checkpoint was written, if loaded from a file
    pub saved_at: Option<DateTime<Utc>>,

    pub archive_path: Option<PathBuf>,

    /// Hash of the configuration of the last `run`
    pub config_hash: Option<String>,

    /// Number of archived records
    pub total_records: usize,

    /// Number of ids in the dedup set
    pub known_ids: usize,

    pub with_abstract: usize,

    pub with_full_text: usize,

    /// Records per provenance, most productive first
    pub by_provenance: Vec<(String, usize)>,
}

impl CheckpointStatistics {
    /// Computes statistics for an in-memory state
    pub fn from_state(state: &CrawlState) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for entry in state.results.values() {
            for provenance in &entry.found_by {
                *counts.entry(provenance.to_string()).or_insert(0) += 1;
            }
        }

        let mut by_provenance: Vec<_> = counts.into_iter().collect();
        by_provenance.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            saved_at: None,
            archive_path: state.archive_path.clone(),
            config_hash: state.config_hash.clone(),
            total_records: state.results.len(),
            known_ids: state.known_ids.len(),
            with_abstract: state
                .results
                .values()
                .filter(|e| e.abstract_text.is_some())
                .count(),
            with_full_text: state
                .results
                .values()
                .filter(|e| e.full_text_ref.is_some())
                .count(),
            by_provenance,
        }
    }
}

/// Loads statistics from a checkpoint file
///
/// # Arguments
///
/// * `path` - The checkpoint to read
///
/// # Returns
///
/// * `Ok(CheckpointStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - The checkpoint is unreadable or corrupted
pub fn load_statistics(path: &Path) -> StorageResult<CheckpointStatistics> {
    let snapshot = Snapshot::read_from(path)?;
    let saved_at = snapshot.saved_at;
    let state = snapshot.into_state()?;

    let mut stats = CheckpointStatistics::from_state(&state);
    stats.saved_at = Some(saved_at);
    Ok(stats)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CheckpointStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    if let Some(saved_at) = stats.saved_at {
        println!("  Saved at: {}", saved_at.to_rfc3339());
    }
    match &stats.archive_path {
        Some(path) => println!("  Archive: {}", path.display()),
        None => println!("  Archive: none (in memory)"),
    }
    if let Some(hash) = &stats.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!("  Records: {}", stats.total_records);
    println!("  Known ids: {}", stats.known_ids);
    println!(
        "  With abstract: {} ({:.1}%)",
        stats.with_abstract,
        percentage(stats.with_abstract, stats.total_records)
    );
    println!(
        "  With free full text: {} ({:.1}%)",
        stats.with_full_text,
        percentage(stats.with_full_text, stats.total_records)
    );
    println!();

    if !stats.by_provenance.is_empty() {
        println!("Records by Search:");
        for (provenance, count) in &stats.by_provenance {
            println!("  {}: {}", provenance, count);
        }
        println!();
    }
}

/// Prints the outcome of a crawl call
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    println!("  Records processed: {}", report.processed);
    println!("  New records: {}", report.added.len());
    println!("  Already known: {}", report.deduplicated);
    println!("  Failed: {}", report.failed);
    println!("  Result pages fetched: {}", report.pages_fetched);

    if !report.failed_ids.is_empty() {
        println!("\nFailed PMIDs:");
        for id in &report.failed_ids {
            println!("  - {}", id);
        }
    }

    if report.cancelled {
        println!("\nStopped early on request.");
    }
    println!();
}
