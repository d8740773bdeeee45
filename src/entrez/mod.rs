//! Entrez E-utilities retrieval path
//!
//! Direct HTTP access to NCBI's ESearch/EFetch endpoints with history-server
//! pagination. Bounded to [`MAX_RESULTS`] matches; larger result sets must
//! use the [`edirect`](crate::edirect) path.

mod client;
mod responses;

pub use client::{EntrezClient, MAX_RESULTS};

/// A history server session: ESearch stores the matched IDs server-side and
/// hands back these identifiers for subsequent EFetch paging.
#[derive(Debug, Clone)]
pub struct HistorySession {
    pub webenv: String,
    pub query_key: String,
}
