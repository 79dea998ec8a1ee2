//! Configuration module for pubmed-crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pubmed_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Archiving to {:?}", config.archive.path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, CheckpointConfig, CitationJob, Config, HttpConfig, SearchJob,
    DEFAULT_MAX_RESULTS,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash};
pub use validation::{validate_http_config, validate_pmid};
