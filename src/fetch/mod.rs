//! Page fetching for the crawler
//!
//! The traversal core only talks to PubMed through the [`PageSource`] trait:
//! one call returns a page of result rows, the other the detail fields of a
//! single article. [`HttpSource`] implements it over HTTP:
//! - HTTP client construction with an identifying user agent
//! - status code classification into [`FetchError`]
//! - HTML extraction of result listings and article pages

mod client;
#[cfg(test)]
pub(crate) mod mock;
mod parser;

pub use client::{build_http_client, HttpSource};
pub use parser::{parse_detail_page, parse_results_page};

use crate::query::QueryDescriptor;
use crate::record::{Record, RecordDetail};
use crate::FetchError;
use async_trait::async_trait;

/// One row of a result listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: String,
    pub title: String,
    pub authors_long: String,
    /// Absent on citation listings
    pub authors_short: Option<String>,
    pub citation: String,
}

impl From<ResultRow> for Record {
    fn from(row: ResultRow) -> Self {
        Record::from_listing(
            row.id,
            Some(row.title),
            Some(row.authors_long),
            row.authors_short,
            Some(row.citation),
        )
    }
}

/// One page of a result listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// Number of results the server reports for the whole query
    pub total_count: usize,
    pub rows: Vec<ResultRow>,
}

/// Capability to read PubMed listings and article pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches result page `page` (1-based) of `query`
    async fn fetch_page(&self, query: &QueryDescriptor, page: u32)
        -> Result<ResultPage, FetchError>;

    /// Fetches the detail fields of the article with the given PMID
    async fn fetch_detail(&self, id: &str) -> Result<RecordDetail, FetchError>;
}
