//! "Cited by" traversal

use crate::fetch::PageSource;
use crate::query::QueryDescriptor;
use crate::stream::PagedResultStream;
use crate::StreamError;
use std::sync::Arc;

/// Opens result streams over the articles citing a record
///
/// Pagination and error policy are those of [`PagedResultStream`]; only the
/// query differs from a text search.
pub struct CitationExpander;

impl CitationExpander {
    /// Opens the "cited by" listing of the article with PMID `id`
    pub async fn open<S: PageSource + ?Sized>(
        source: Arc<S>,
        id: &str,
    ) -> Result<PagedResultStream<S>, StreamError> {
        PagedResultStream::open(source, QueryDescriptor::cited_by(id)).await
    }
}
