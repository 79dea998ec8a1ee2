//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: known ids, archive location and merged results
//! - `Snapshot`: versioned, checksummed checkpoint of a `CrawlState`

mod crawl_state;
mod snapshot;

// Re-export main types
pub use crawl_state::CrawlState;
pub use snapshot::{compute_state_checksum, Snapshot, SNAPSHOT_VERSION};
