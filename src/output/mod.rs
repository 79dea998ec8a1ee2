//! Output module for crawl reports and exports
//!
//! This module handles:
//! - Printing the report of a crawl call
//! - Computing and printing checkpoint statistics
//! - Exporting archived records as a markdown bibliography

mod markdown;
pub mod stats;

pub use markdown::{export_markdown, format_bibliography};
pub use stats::{load_statistics, print_report, print_statistics, CheckpointStatistics};
