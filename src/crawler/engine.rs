//! Crawl engine - traversal, dedup and archiving
//!
//! The engine drives result streams one record at a time:
//! - new ids get a detail fetch, are archived and become known
//! - known ids only gain provenance and missing metadata
//! - citation expansion reuses the same stream over "cited by" listings
//!
//! Its whole state can be captured as a [`Snapshot`] and restored later
//! without touching the network.

use crate::config::{CitationJob, SearchJob};
use crate::crawler::CrawlReport;
use crate::fetch::PageSource;
use crate::query::{QueryDescriptor, SearchFilters};
use crate::record::{ArchiveEntry, Provenance, Record};
use crate::state::{CrawlState, Snapshot};
use crate::storage::{open_archive, ArchiveStore};
use crate::stream::{CitationExpander, PagedResultStream};
use crate::{CrawlerError, Result, StreamError};
use chrono::Local;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records between two progress lines
const PROGRESS_INTERVAL: usize = 25;

/// Deduplicating, resumable PubMed crawler
pub struct CrawlEngine<S: PageSource + ?Sized> {
    source: Arc<S>,
    archive: Option<Box<dyn ArchiveStore>>,
    state: CrawlState,
    cancelled: Arc<AtomicBool>,
}

/// Adds the counters of `prior` calls to the partial report of a failure
pub(super) fn with_prior(prior: CrawlReport, err: CrawlerError) -> CrawlerError {
    match err {
        CrawlerError::Traversal { report, source } => {
            let mut total = prior;
            total.merge(report);
            CrawlerError::Traversal {
                report: total,
                source,
            }
        }
        other => other,
    }
}

impl<S: PageSource + ?Sized> CrawlEngine<S> {
    /// Creates an engine that keeps its results in memory only
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            archive: None,
            state: CrawlState::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates an engine archiving to `path`
    ///
    /// # Arguments
    ///
    /// * `source` - Where result pages and details come from
    /// * `path` - Archive directory or SQLite file, created if missing
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Engine with an open archive
    /// * `Err(CrawlerError)` - The archive could not be opened
    pub fn with_archive(source: Arc<S>, path: &Path) -> Result<Self> {
        let archive = open_archive(path)?;
        let mut engine = Self::with_store(source, archive);
        engine.state.archive_path = Some(path.to_path_buf());
        Ok(engine)
    }

    /// Creates an engine writing to an already opened store
    pub fn with_store(source: Arc<S>, store: Box<dyn ArchiveStore>) -> Self {
        Self {
            archive: Some(store),
            ..Self::new(source)
        }
    }

    /// Creates an engine from a checkpoint file
    pub fn resume(path: &Path, source: Arc<S>) -> Result<Self> {
        let snapshot = Snapshot::read_from(path)?;
        let mut engine = Self::new(source);
        engine.restore(snapshot)?;
        tracing::info!(
            "Resumed {} records from {}",
            engine.state.len(),
            path.display()
        );
        Ok(engine)
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn archive(&self) -> Option<&dyn ArchiveStore> {
        self.archive.as_deref()
    }

    /// Flag that stops the current call before its next pull once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Records the hash of the configuration driving this crawl
    ///
    /// Returns true if the state was last run with a different configuration.
    pub fn adopt_config_hash(&mut self, hash: &str) -> bool {
        let changed = self
            .state
            .config_hash
            .as_deref()
            .is_some_and(|previous| previous != hash);
        if changed {
            tracing::warn!(
                "Configuration changed since the checkpoint was saved ({} -> {})",
                self.state.config_hash.as_deref().unwrap_or_default(),
                hash
            );
        }
        self.state.config_hash = Some(hash.to_string());
        changed
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Archives up to `limit` results of a free-text search
    pub async fn search_for(
        &mut self,
        text: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<CrawlReport> {
        let query = QueryDescriptor::search(text, *filters);
        let stream = self.open(PagedResultStream::open(self.source.clone(), query)).await?;
        self.traverse(stream, Provenance::query(text), limit).await
    }

    /// Archives up to `limit` articles citing the article `id`
    pub async fn expand_citations(&mut self, id: &str, limit: usize) -> Result<CrawlReport> {
        let stream = self
            .open(CitationExpander::open(self.source.clone(), id))
            .await?;
        self.traverse(stream, Provenance::cited_by(id), limit).await
    }

    /// Expands citations breadth first for `depth` levels
    ///
    /// Each level expands only the records the previous level added, so
    /// citation cycles end once every member is known.
    pub async fn crawl_citations(
        &mut self,
        id: &str,
        limit: usize,
        depth: u32,
    ) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();
        let mut frontier = vec![id.to_string()];

        for level in 1..=depth {
            if frontier.is_empty() {
                break;
            }
            tracing::info!(
                "Citation level {} of {}: expanding {} records",
                level,
                depth,
                frontier.len()
            );

            let mut next = Vec::new();
            for parent in frontier {
                if self.is_cancelled() {
                    report.cancelled = true;
                    return Ok(report);
                }
                let expanded = match self.expand_citations(&parent, limit).await {
                    Ok(expanded) => expanded,
                    Err(e) => return Err(with_prior(report, e)),
                };
                next.extend(expanded.added.iter().cloned());
                report.merge(expanded);
                if report.cancelled {
                    return Ok(report);
                }
            }
            frontier = next;
        }

        Ok(report)
    }

    /// Archives the articles added to PubMed today
    pub async fn latest(&mut self, limit: usize) -> Result<CrawlReport> {
        let day = Local::now().date_naive();
        let query = QueryDescriptor::latest(day);
        let provenance = Provenance::query(format!("latest:{}", day));
        let stream = self.open(PagedResultStream::open(self.source.clone(), query)).await?;
        self.traverse(stream, provenance, limit).await
    }

    /// Runs a configured search and the citation crawl it asks for
    pub async fn run_search(&mut self, job: &SearchJob) -> Result<CrawlReport> {
        let filters = job.filters()?;
        let mut report = self.search_for(&job.text, job.max_results, &filters).await?;
        if job.citation_depth == 0 || report.cancelled {
            return Ok(report);
        }

        for id in report.added.clone() {
            match self
                .crawl_citations(&id, job.citation_limit, job.citation_depth)
                .await
            {
                Ok(expanded) => report.merge(expanded),
                Err(e) => return Err(with_prior(report, e)),
            }
            if report.cancelled {
                break;
            }
        }
        Ok(report)
    }

    /// Runs a configured citation crawl
    pub async fn run_citation_job(&mut self, job: &CitationJob) -> Result<CrawlReport> {
        self.crawl_citations(&job.id, job.max_results, job.depth)
            .await
    }

    /// Captures the whole crawl state
    pub fn checkpoint(&self) -> Result<Snapshot> {
        Ok(Snapshot::from_state(self.state.clone())?)
    }

    /// Replaces the crawl state with a checkpoint
    ///
    /// The archive is reopened at the restored path; no request is made.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let state = snapshot.into_state()?;
        self.archive = match &state.archive_path {
            Some(path) => Some(open_archive(path)?),
            None => None,
        };
        self.state = state;
        Ok(())
    }

    pub fn save_checkpoint(&self, path: &Path) -> Result<()> {
        self.checkpoint()?.write_to(path)?;
        tracing::info!(
            "Checkpoint saved to {} ({} records)",
            path.display(),
            self.state.len()
        );
        Ok(())
    }

    async fn open(
        &self,
        opening: impl Future<Output = std::result::Result<PagedResultStream<S>, StreamError>>,
    ) -> Result<Option<PagedResultStream<S>>> {
        if self.is_cancelled() {
            return Ok(None);
        }
        match opening.await {
            Ok(stream) => Ok(Some(stream)),
            Err(source) => {
                tracing::error!("Traversal aborted: {}", source);
                Err(CrawlerError::Traversal {
                    report: CrawlReport::default(),
                    source,
                })
            }
        }
    }

    async fn traverse(
        &mut self,
        stream: Option<PagedResultStream<S>>,
        provenance: Provenance,
        limit: usize,
    ) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();
        let Some(stream) = stream else {
            report.cancelled = true;
            return Ok(report);
        };

        tracing::info!(
            "Traversing {} ({} results, limit {})",
            stream.query(),
            stream.total_count(),
            limit
        );
        let mut produced = stream.produce(limit);

        loop {
            if self.is_cancelled() {
                tracing::info!("Cancelled after {} records", report.processed);
                report.cancelled = true;
                break;
            }

            let next = produced.next().await;
            report.pages_fetched = produced.pages_fetched();
            let record = match next {
                None => break,
                Some(Ok(record)) => record,
                Some(Err(source)) => {
                    tracing::error!(
                        "Traversal aborted at page {} of {}: {}",
                        source.page(),
                        source.query(),
                        source
                    );
                    return Err(CrawlerError::Traversal { report, source });
                }
            };

            report.processed += 1;
            self.ingest(record, &provenance, &mut report).await?;

            if report.processed % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} of {} records, {} new, {} known, {} failed",
                    report.processed,
                    produced.total_count().min(limit),
                    report.added.len(),
                    report.deduplicated,
                    report.failed
                );
            }
        }

        tracing::info!(
            "Finished {}: {} records, {} new, {} known, {} failed",
            produced.query(),
            report.processed,
            report.added.len(),
            report.deduplicated,
            report.failed
        );
        Ok(report)
    }

    async fn ingest(
        &mut self,
        mut record: Record,
        provenance: &Provenance,
        report: &mut CrawlReport,
    ) -> Result<()> {
        let id = record.id.clone();

        if self.state.is_known(&id) {
            tracing::debug!("PMID {} already known", id);
            report.deduplicated += 1;
            if let Some(entry) = self.state.entry_mut(&id) {
                entry.absorb(&record);
            }
            return self.note_found_by(&id, provenance);
        }

        match self.source.fetch_detail(&id).await {
            Ok(detail) => record.apply_detail(detail),
            Err(e) => {
                if e.is_not_found() {
                    tracing::warn!("Skipping PMID {}: no article page", id);
                } else {
                    tracing::warn!("Skipping PMID {}: {}", id, e);
                }
                report.failed += 1;
                report.failed_ids.push(id);
                return Ok(());
            }
        }

        let entry = ArchiveEntry::from_record(&record);
        if let Some(archive) = self.archive.as_mut() {
            if let Some(text) = &entry.abstract_text {
                archive.put_text(&id, text)?;
            }
            archive.put_meta(&id, &entry)?;
        }
        tracing::debug!("Archived {}", record);

        self.state.insert(entry);
        report.added.push(id.clone());
        self.note_found_by(&id, provenance)
    }

    fn note_found_by(&mut self, id: &str, provenance: &Provenance) -> Result<()> {
        if self.state.add_found_by(id, provenance.clone()) {
            if let Some(archive) = self.archive.as_mut() {
                archive.append_found_by(id, provenance)?;
            }
        }
        Ok(())
    }
}
