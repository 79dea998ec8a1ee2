use crate::query::{SearchFilters, DEFAULT_BASE_URL};
use crate::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// Default number of records pulled per search or expansion
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Main configuration structure for pubmed-crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub search: Vec<SearchJob>,
    #[serde(default)]
    pub citations: Vec<CitationJob>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Root of the PubMed web interface
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_email: "crawler@example.org".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Archive configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveConfig {
    /// Archive directory or SQLite file; records stay in memory when unset
    pub path: Option<PathBuf>,
}

/// Checkpoint configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckpointConfig {
    /// Snapshot file written after every job
    pub path: Option<PathBuf>,
}

fn default_limited_to() -> String {
    "none".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_depth() -> u32 {
    1
}

/// A free-text search, optionally followed by citation expansion
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchJob {
    pub text: String,

    /// Publication date window: `1_year`, `5_years`, `10_years` or `none`
    #[serde(rename = "limited-to", default = "default_limited_to")]
    pub limited_to: String,

    #[serde(rename = "require-abstract", default = "default_true")]
    pub require_abstract: bool,

    #[serde(rename = "max-results", default = "default_max_results")]
    pub max_results: usize,

    /// Citation levels to follow from every newly found record
    #[serde(rename = "citation-depth", default)]
    pub citation_depth: u32,

    /// Records pulled per citation expansion
    #[serde(rename = "citation-limit", default = "default_max_results")]
    pub citation_limit: usize,
}

impl SearchJob {
    /// Creates a job with default filters and limits
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limited_to: default_limited_to(),
            require_abstract: true,
            max_results: DEFAULT_MAX_RESULTS,
            citation_depth: 0,
            citation_limit: DEFAULT_MAX_RESULTS,
        }
    }

    /// Parses the filter settings of this job
    pub fn filters(&self) -> Result<SearchFilters, ConfigError> {
        SearchFilters::parse(&self.limited_to, self.require_abstract)
    }
}

/// A "cited by" expansion starting from one article
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CitationJob {
    /// PMID of the cited article
    pub id: String,

    #[serde(rename = "max-results", default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_depth")]
    pub depth: u32,
}

impl CitationJob {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_results: DEFAULT_MAX_RESULTS,
            depth: default_depth(),
        }
    }
}
