//! Crawler module for PubMed traversal
//!
//! This module contains the core crawling logic, including:
//! - Paging through search and "cited by" listings
//! - Deduplication against previously archived records
//! - Provenance tracking per record
//! - Checkpointing between configured jobs

mod engine;
mod report;

pub use engine::CrawlEngine;
pub use report::CrawlReport;

use engine::with_prior;

use crate::config::Config;
use crate::fetch::PageSource;
use crate::Result;
use std::path::Path;

/// Runs every job of a configuration file
///
/// Searches run first, then citation crawls, each in file order. The
/// checkpoint (when given) is written after every finished job.
///
/// # Arguments
///
/// * `engine` - The engine to run the jobs on
/// * `config` - The loaded configuration
/// * `checkpoint` - Snapshot file to refresh after each job
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Combined report of all jobs
/// * `Err(CrawlerError)` - A job failed; a traversal error carries the
///   combined report of every job run so far
pub async fn run_jobs<S: PageSource + ?Sized>(
    engine: &mut CrawlEngine<S>,
    config: &Config,
    checkpoint: Option<&Path>,
) -> Result<CrawlReport> {
    let mut total = CrawlReport::default();
    let jobs = config.search.len() + config.citations.len();
    tracing::info!("Running {} configured jobs", jobs);

    for job in &config.search {
        let report = match engine.run_search(job).await {
            Ok(report) => report,
            Err(e) => return Err(with_prior(total, e)),
        };
        tracing::info!(
            "Search \"{}\": {} new, {} known, {} failed",
            job.text,
            report.added.len(),
            report.deduplicated,
            report.failed
        );
        total.merge(report);
        save(engine, checkpoint)?;
        if total.cancelled {
            return Ok(total);
        }
    }

    for job in &config.citations {
        let report = match engine.run_citation_job(job).await {
            Ok(report) => report,
            Err(e) => return Err(with_prior(total, e)),
        };
        tracing::info!(
            "Citations of PMID {}: {} new, {} known, {} failed",
            job.id,
            report.added.len(),
            report.deduplicated,
            report.failed
        );
        total.merge(report);
        save(engine, checkpoint)?;
        if total.cancelled {
            return Ok(total);
        }
    }

    Ok(total)
}

fn save<S: PageSource + ?Sized>(engine: &CrawlEngine<S>, checkpoint: Option<&Path>) -> Result<()> {
    match checkpoint {
        Some(path) => engine.save_checkpoint(path),
        None => Ok(()),
    }
}
