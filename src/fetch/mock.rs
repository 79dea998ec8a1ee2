//! Scripted source for testing purposes.

use crate::fetch::{PageSource, ResultPage, ResultRow};
use crate::query::QueryDescriptor;
use crate::record::RecordDetail;
use crate::FetchError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A [`PageSource`] serving predefined listings and recording every call.
///
/// Listings are cut into pages of `page_size` rows. Every article gets a
/// generated detail unless it is set to fail.
#[derive(Debug, Default)]
pub struct MockSource {
    page_size: usize,
    results: HashMap<QueryDescriptor, Vec<ResultRow>>,
    totals: HashMap<QueryDescriptor, usize>,
    failing_pages: HashSet<(QueryDescriptor, u32)>,
    failing_details: HashSet<String>,
    page_calls: Mutex<Vec<(QueryDescriptor, u32)>>,
    detail_calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source with the given page size.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Serve `rows` for `query`.
    pub fn with_results(mut self, query: QueryDescriptor, rows: Vec<ResultRow>) -> Self {
        self.results.insert(query, rows);
        self
    }

    /// Report `total` results for `query` regardless of the scripted rows.
    pub fn with_total(mut self, query: QueryDescriptor, total: usize) -> Self {
        self.totals.insert(query, total);
        self
    }

    /// Fail every request for page `page` of `query`.
    pub fn fail_page(mut self, query: QueryDescriptor, page: u32) -> Self {
        self.failing_pages.insert((query, page));
        self
    }

    /// Answer the detail page of `id` with HTTP 404.
    pub fn fail_detail(mut self, id: &str) -> Self {
        self.failing_details.insert(id.to_string());
        self
    }

    /// Every page request made so far, in order.
    pub fn page_calls(&self) -> Vec<(QueryDescriptor, u32)> {
        self.page_calls.lock().unwrap().clone()
    }

    /// Every detail request made so far, in order.
    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockSource {
    async fn fetch_page(
        &self,
        query: &QueryDescriptor,
        page: u32,
    ) -> Result<ResultPage, FetchError> {
        self.page_calls.lock().unwrap().push((query.clone(), page));

        if self.failing_pages.contains(&(query.clone(), page)) {
            return Err(FetchError::Status {
                url: format!("mock://{}?page={}", query, page),
                status: 503,
            });
        }

        let rows = self.results.get(query).cloned().unwrap_or_default();
        let total_count = self.totals.get(query).copied().unwrap_or(rows.len());
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        let end = (start + self.page_size).min(rows.len());
        let rows = if start < end {
            rows[start..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(ResultPage { total_count, rows })
    }

    async fn fetch_detail(&self, id: &str) -> Result<RecordDetail, FetchError> {
        self.detail_calls.lock().unwrap().push(id.to_string());

        if self.failing_details.contains(id) {
            return Err(FetchError::Status {
                url: format!("mock://{}/", id),
                status: 404,
            });
        }

        Ok(RecordDetail {
            title: Some(format!("Article {}", id)),
            authors: Some(format!("Author {}.", id)),
            publication: Some("Journal. 2020.".to_string()),
            abstract_text: Some(format!("Abstract of {}.", id)),
            full_text_ref: None,
        })
    }
}

/// Helper function to create a search listing row for testing.
pub fn row(id: &str) -> ResultRow {
    ResultRow {
        id: id.to_string(),
        title: format!("Article {}", id),
        authors_long: format!("Author {}, Coauthor {}", id, id),
        authors_short: Some(format!("Author {}, et al.", id)),
        citation: "Journal. 2020.".to_string(),
    }
}

/// Helper function to create a "cited by" listing row for testing.
pub fn citation_row(id: &str) -> ResultRow {
    ResultRow {
        authors_short: None,
        ..row(id)
    }
}
