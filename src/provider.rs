//! Common search capability implemented by both retrieval paths

use std::future::Future;

use crate::error::Result;
use crate::table::ArticleTable;

/// Default number of articles fetched per page on the Entrez API path
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Per-search tuning knobs
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Articles fetched per page request (Entrez API path only; the EDirect
    /// pipeline manages its own batching)
    pub batch_size: usize,
    /// Emit a progress event as each page completes
    pub report_progress: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            report_progress: false,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size; values below 1 are clamped to 1
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, report_progress: bool) -> Self {
        self.report_progress = report_progress;
        self
    }
}

/// A source of PubMed search results shaped as an [`ArticleTable`].
///
/// Both [`EntrezClient`](crate::EntrezClient) and
/// [`EDirectClient`](crate::EDirectClient) implement this, so callers can
/// swap retrieval paths without touching downstream code:
///
/// ```no_run
/// use pubmed_tools::{Result, SearchOptions, SearchProvider};
///
/// async fn count_hits(provider: &impl SearchProvider, query: &str) -> Result<usize> {
///     let table = provider
///         .search_table(query, &SearchOptions::default())
///         .await?;
///     Ok(table.len())
/// }
/// ```
pub trait SearchProvider {
    /// Run `query` against PubMed and materialize the matches as a table
    fn search_table(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Result<ArticleTable>> + Send;
}
