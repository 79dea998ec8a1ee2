/// Outcome counters of one engine call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Records pulled from result streams
    pub processed: usize,

    /// Pulled records whose id was already known
    pub deduplicated: usize,

    /// New records whose detail fetch failed
    pub failed: usize,

    /// Ids archived for the first time, in discovery order
    pub added: Vec<String>,

    pub failed_ids: Vec<String>,

    /// Result pages requested
    pub pages_fetched: u32,

    /// The call stopped early on a cancellation request
    pub cancelled: bool,
}

impl CrawlReport {
    /// Folds the counters of a later call into this report
    pub fn merge(&mut self, other: CrawlReport) {
        self.processed += other.processed;
        self.deduplicated += other.deduplicated;
        self.failed += other.failed;
        self.added.extend(other.added);
        self.failed_ids.extend(other.failed_ids);
        self.pages_fetched += other.pages_fetched;
        self.cancelled |= other.cancelled;
    }
}
