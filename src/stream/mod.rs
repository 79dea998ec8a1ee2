//! Lazy, page-at-a-time traversal of one result set
//!
//! A [`PagedResultStream`] is opened for a [`QueryDescriptor`]: it fetches
//! page 1 immediately to learn the server's total, then hands out records on
//! demand, fetching the next page only when the consumer reaches the end of
//! what has been fetched so far. Search listings and citation listings share
//! this single implementation; [`CitationExpander`] only picks the query.
//!
//! # Lifecycle
//!
//! ```text
//! open() -> produce(limit) -> Paging -> { yield | fetch next page } -> Exhausted | Errored
//! ```
//!
//! Suspension points are page fetches; a record is never half delivered.

mod citations;

pub use citations::CitationExpander;

use crate::fetch::{PageSource, ResultRow};
use crate::query::QueryDescriptor;
use crate::record::Record;
use crate::StreamError;
use std::sync::Arc;

/// Fetched portion of one logical result set
pub struct PagedResultStream<S: PageSource + ?Sized> {
    source: Arc<S>,
    query: QueryDescriptor,
    total_count: usize,
    fetched: Vec<Record>,
    /// Last page fetched, 1-based
    cursor: u32,
    last_page_added: usize,
}

impl<S: PageSource + ?Sized> PagedResultStream<S> {
    /// Opens a stream by fetching page 1 of `query`
    ///
    /// # Returns
    ///
    /// * `Ok(PagedResultStream)` - total count known, first page buffered
    /// * `Err(StreamError::Transport)` - page 1 could not be fetched
    pub async fn open(source: Arc<S>, query: QueryDescriptor) -> Result<Self, StreamError> {
        tracing::debug!("Opening {}", query);
        let page = source
            .fetch_page(&query, 1)
            .await
            .map_err(|source| StreamError::Transport {
                query: query.to_string(),
                page: 1,
                source,
            })?;

        tracing::info!("{}: {} results", query, page.total_count);

        let mut stream = Self {
            source,
            query,
            total_count: page.total_count,
            fetched: Vec::new(),
            cursor: 1,
            last_page_added: 0,
        };
        stream.last_page_added = stream.append(page.rows);
        Ok(stream)
    }

    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    /// Number of results the server reported on page 1
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Records fetched so far, in server order
    pub fn fetched(&self) -> &[Record] {
        &self.fetched
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> u32 {
        self.cursor
    }

    /// Turns the stream into a one-shot sequence of at most `limit` records
    pub fn produce(self, limit: usize) -> Produced<S> {
        Produced {
            stream: self,
            limit,
            at: 0,
            phase: StreamPhase::Paging,
        }
    }

    /// Appends rows without growing past the reported total
    fn append(&mut self, rows: Vec<ResultRow>) -> usize {
        let room = self.total_count.saturating_sub(self.fetched.len());
        let before = self.fetched.len();
        self.fetched
            .extend(rows.into_iter().take(room).map(Record::from));
        self.fetched.len() - before
    }

    async fn fetch_next_page(&mut self) -> Result<(), StreamError> {
        let page_number = self.cursor + 1;
        tracing::debug!("Fetching page {} of {}", page_number, self.query);

        let page = self
            .source
            .fetch_page(&self.query, page_number)
            .await
            .map_err(|source| StreamError::Transport {
                query: self.query.to_string(),
                page: page_number,
                source,
            })?;

        self.cursor = page_number;
        if page.total_count != self.total_count {
            tracing::debug!(
                "{} now reports {} results (was {}), keeping the original total",
                self.query,
                page.total_count,
                self.total_count
            );
        }

        self.last_page_added = self.append(page.rows);
        if self.last_page_added == 0 {
            return Err(self.inconsistent());
        }
        Ok(())
    }

    fn inconsistent(&self) -> StreamError {
        StreamError::InconsistentResults {
            query: self.query.to_string(),
            page: self.cursor,
            total: self.total_count,
            fetched: self.fetched.len(),
        }
    }
}

/// Traversal state of a [`Produced`] sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// More records may follow
    Paging,
    /// The limit or the reported total was reached
    Exhausted,
    /// A page fetch failed; fetched records remain readable
    Errored,
}

impl StreamPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Paging)
    }
}

/// One-shot pull sequence over a [`PagedResultStream`]
pub struct Produced<S: PageSource + ?Sized> {
    stream: PagedResultStream<S>,
    limit: usize,
    at: usize,
    phase: StreamPhase,
}

impl<S: PageSource + ?Sized> Produced<S> {
    /// Returns the next record, fetching a page first if needed
    ///
    /// Yields `None` once `min(total_count, limit)` records were produced or
    /// after the first error.
    pub async fn next(&mut self) -> Option<Result<Record, StreamError>> {
        if self.phase.is_terminal() {
            return None;
        }

        let end = self.stream.total_count.min(self.limit);
        if self.at >= end {
            self.phase = StreamPhase::Exhausted;
            return None;
        }

        if self.at == self.stream.fetched.len() {
            let result = if self.stream.last_page_added == 0 {
                Err(self.stream.inconsistent())
            } else {
                self.stream.fetch_next_page().await
            };
            if let Err(e) = result {
                self.phase = StreamPhase::Errored;
                return Some(Err(e));
            }
        }

        let record = self.stream.fetched[self.at].clone();
        self.at += 1;
        Some(Ok(record))
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn total_count(&self) -> usize {
        self.stream.total_count
    }

    pub fn fetched(&self) -> &[Record] {
        self.stream.fetched()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.stream.pages_fetched()
    }

    pub fn query(&self) -> &QueryDescriptor {
        self.stream.query()
    }
}
