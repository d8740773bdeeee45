//! # PubMed Tools
//!
//! A Rust client library for searching the PubMed literature database and
//! retrieving structured article metadata (title, abstract, authors,
//! publication date, MeSH terms) as a tabular result.
//!
//! Two retrieval paths are offered:
//!
//! - **[`EntrezClient`]**: direct HTTP access to NCBI's E-utilities API,
//!   paging through results in fixed-size batches. Limited to 10,000 results
//!   per search; a search matching more fails rather than truncating.
//! - **[`EDirectClient`]**: delegates to the locally installed NCBI Entrez
//!   Direct toolkit (`esearch | efetch`), with no result ceiling.
//!   [`EDirectInstaller`] downloads and unpacks the toolkit when absent.
//!
//! Both implement [`SearchProvider`] and produce the same [`ArticleTable`]
//! shape, so callers can swap paths without touching downstream code.
//!
//! ## Searching via the Entrez API
//!
//! ```no_run
//! use pubmed_tools::{ClientConfig, EntrezClient, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new().with_email("researcher@university.edu");
//!     let client = EntrezClient::with_config(config);
//!
//!     let options = SearchOptions::new().with_batch_size(500).with_progress(true);
//!     let table = client
//!         .search_with_options("cancer AND 2020[dp]", &options)
//!         .await?;
//!
//!     for article in &table {
//!         println!("{}: {}", article.pmid, article.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Searching via Entrez Direct
//!
//! ```no_run
//! use pubmed_tools::{EDirectClient, EDirectInstaller};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let edirect_dir = "/opt/edirect";
//!
//!     // Idempotent: downloads the toolkit only when missing
//!     EDirectInstaller::new().prepare(edirect_dir).await?;
//!
//!     let table = EDirectClient::new(edirect_dir).search("cancer").await?;
//!     println!("{} articles", table.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod edirect;
pub mod entrez;
pub mod error;
pub mod medline;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod table;

pub use config::ClientConfig;
pub use edirect::{EDirectClient, EDirectInstaller, HostPlatform};
pub use entrez::{EntrezClient, MAX_RESULTS};
pub use error::{PubMedError, Result};
pub use provider::{SearchOptions, SearchProvider};
pub use table::{ArticleRecord, ArticleTable};
