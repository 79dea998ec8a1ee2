//! pubmed-crawler: a resumable PubMed citation crawler
//!
//! This crate pages through PubMed search results, follows the "cited by"
//! relation between articles, and archives every record it finds exactly once,
//! remembering which searches led to it. Crawl state can be checkpointed and
//! resumed without replaying any requests.

pub mod config;
pub mod crawler;
pub mod fetch;
pub mod output;
pub mod query;
pub mod record;
pub mod state;
pub mod storage;
pub mod stream;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Traversal aborted after {} records: {source}", .report.processed)]
    Traversal {
        report: crawler::CrawlReport,
        #[source]
        source: StreamError,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid search filter value \"{0}\"")]
    InvalidFilter(String),
}

/// Failure of a single request made through a [`fetch::PageSource`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read page {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Returns true if the server reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Terminal errors of a paginated result stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("fetching page {page} of {query} failed: {source}")]
    Transport {
        query: String,
        page: u32,
        #[source]
        source: FetchError,
    },

    #[error(
        "{query} reported {total} results but page {page} added nothing after {fetched} records"
    )]
    InconsistentResults {
        query: String,
        page: u32,
        total: usize,
        fetched: usize,
    },
}

impl StreamError {
    /// Page number the stream was working on when it failed
    pub fn page(&self) -> u32 {
        match self {
            Self::Transport { page, .. } | Self::InconsistentResults { page, .. } => *page,
        }
    }

    /// Human readable description of the query that failed
    pub fn query(&self) -> &str {
        match self {
            Self::Transport { query, .. } | Self::InconsistentResults { query, .. } => query,
        }
    }
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlReport};
pub use fetch::{HttpSource, PageSource};
pub use query::{DateFilter, QueryDescriptor, SearchFilters};
pub use record::{ArchiveEntry, Provenance, Record, RecordDetail};
pub use state::{CrawlState, Snapshot};
pub use stream::{CitationExpander, PagedResultStream};
