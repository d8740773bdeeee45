use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::entrez::responses::ESearchResult;
use crate::entrez::HistorySession;
use crate::error::{PubMedError, Result};
use crate::medline::parse_medline;
use crate::provider::{SearchOptions, SearchProvider};
use crate::rate_limit::RateLimiter;
use crate::retry::with_retry;
use crate::table::{ArticleRecord, ArticleTable};

/// Largest result set retrievable through the E-utilities API; searches
/// matching more must go through the EDirect pipeline instead.
pub const MAX_RESULTS: usize = 10_000;

/// Client for the PubMed Entrez E-utilities API.
///
/// Runs an ESearch against the history server to learn the match count, then
/// pages through EFetch in MEDLINE format until all matches (at most
/// [`MAX_RESULTS`]) have been collected into an [`ArticleTable`].
///
/// # Example
///
/// ```no_run
/// use pubmed_tools::{ClientConfig, EntrezClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new().with_email("researcher@university.edu");
///     let client = EntrezClient::with_config(config);
///
///     let table = client.search("cancer AND 2020[dp]").await?;
///     for article in &table {
///         println!("{}: {}", article.pmid, article.title);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EntrezClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl EntrezClient {
    /// Create a client with default configuration (anonymous, 3 requests/s)
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();

        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(config.effective_timeout())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            rate_limiter,
            config,
        }
    }

    /// Search PubMed with default options (pages of 1000, no progress events)
    pub async fn search(&self, term: &str) -> Result<ArticleTable> {
        self.search_with_options(term, &SearchOptions::default())
            .await
    }

    /// Search PubMed and materialize every match as a table row.
    ///
    /// # Errors
    ///
    /// * [`PubMedError::ResultLimitExceeded`] - the search matched more than
    ///   [`MAX_RESULTS`] articles; no partial table is returned
    /// * [`PubMedError::WebEnvNotAvailable`] - NCBI did not open a history
    ///   session for a non-empty result
    /// * [`PubMedError::RequestError`] / [`PubMedError::ApiError`] - transport
    ///   or service failure
    #[instrument(skip(self, options), fields(term = %term, batch_size = options.batch_size))]
    pub async fn search_with_options(
        &self,
        term: &str,
        options: &SearchOptions,
    ) -> Result<ArticleTable> {
        if term.trim().is_empty() {
            debug!("Empty search term, returning empty table");
            return Ok(ArticleTable::new());
        }

        let (count, session) = self.search_count(term).await?;

        if count > MAX_RESULTS {
            return Err(PubMedError::ResultLimitExceeded {
                matched: count,
                maximum: MAX_RESULTS,
            });
        }

        if count == 0 {
            debug!("Search matched no articles");
            return Ok(ArticleTable::new());
        }

        let session = session.ok_or(PubMedError::WebEnvNotAvailable)?;
        let batch_size = options.batch_size.max(1);

        let mut records: Vec<ArticleRecord> = Vec::with_capacity(count);
        let mut start = 0;

        while start < count {
            let page = self.fetch_page(&session, start, batch_size).await?;
            let end = (start + batch_size).min(count);

            if options.report_progress {
                info!(start, end, total = count, "Downloaded batch");
            }

            if page.is_empty() {
                warn!(start, total = count, "History server returned an empty page");
                break;
            }

            records.extend(page);
            start += batch_size;
        }

        info!(rows = records.len(), total = count, "Search completed");
        Ok(ArticleTable::from_records(records))
    }

    /// ESearch step: match count plus the history session for paging
    async fn search_count(&self, term: &str) -> Result<(usize, Option<HistorySession>)> {
        let url = format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmax=0&retmode=json&usehistory=y",
            self.base_url,
            urlencoding::encode(term)
        );

        debug!("Making ESearch API request");
        let response = self.make_request(&url).await?;
        let search_result: ESearchResult = response.json().await?;

        if let Some(error_msg) = &search_result.esearchresult.error {
            return Err(PubMedError::ApiError {
                status: 200,
                message: format!("NCBI ESearch API error: {error_msg}"),
            });
        }

        let count: usize = search_result
            .esearchresult
            .count
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);

        let session = match (
            search_result.esearchresult.webenv,
            search_result.esearchresult.query_key,
        ) {
            (Some(webenv), Some(query_key)) => Some(HistorySession { webenv, query_key }),
            _ => None,
        };

        debug!(count, has_session = session.is_some(), "ESearch completed");
        Ok((count, session))
    }

    /// EFetch step: one page of MEDLINE records from the history session
    async fn fetch_page(
        &self,
        session: &HistorySession,
        start: usize,
        max: usize,
    ) -> Result<Vec<ArticleRecord>> {
        let url = format!(
            "{}/efetch.fcgi?db=pubmed&query_key={}&WebEnv={}&retstart={}&retmax={}&rettype=medline&retmode=text",
            self.base_url,
            urlencoding::encode(&session.query_key),
            urlencoding::encode(&session.webenv),
            start,
            max
        );

        debug!(start, max, "Making EFetch API request");
        let response = self.make_request(&url).await?;
        let text = response.text().await?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        // EFetch reports history failures as an XML error document even when
        // MEDLINE text was requested
        if text.contains("<ERROR>") {
            let message = text
                .split("<ERROR>")
                .nth(1)
                .and_then(|s| s.split("</ERROR>").next())
                .unwrap_or("Unknown error");
            return Err(PubMedError::ApiError {
                status: 200,
                message: format!("NCBI EFetch API error: {message}"),
            });
        }

        parse_medline(&text)
    }

    /// Make an HTTP request with rate limiting and retry; appends the
    /// configured identification parameters (api_key, email, tool).
    async fn make_request(&self, url: &str) -> Result<Response> {
        let mut final_url = url.to_string();
        let api_params = self.config.build_api_params();

        if !api_params.is_empty() {
            let separator = if url.contains('?') { '&' } else { '?' };
            final_url.push(separator);

            let param_strings: Vec<String> = api_params
                .into_iter()
                .map(|(key, value)| format!("{key}={}", urlencoding::encode(&value)))
                .collect();
            final_url.push_str(&param_strings.join("&"));
        }

        let response = with_retry(
            || async {
                self.rate_limiter.acquire().await?;
                debug!("Making API request to: {final_url}");
                let response = self
                    .client
                    .get(&final_url)
                    .send()
                    .await
                    .map_err(PubMedError::from)?;

                // Server errors and throttling become retryable errors
                if response.status().is_server_error() || response.status().as_u16() == 429 {
                    return Err(PubMedError::ApiError {
                        status: response.status().as_u16(),
                        message: response
                            .status()
                            .canonical_reason()
                            .unwrap_or("Unknown error")
                            .to_string(),
                    });
                }

                Ok(response)
            },
            &self.config.retry_config,
            "NCBI API request",
        )
        .await?;

        if !response.status().is_success() {
            warn!("API request failed with status: {}", response.status());
            return Err(PubMedError::ApiError {
                status: response.status().as_u16(),
                message: response
                    .status()
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        Ok(response)
    }
}

impl Default for EntrezClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchProvider for EntrezClient {
    async fn search_table(&self, query: &str, options: &SearchOptions) -> Result<ArticleTable> {
        self.search_with_options(query, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_config_base_url() {
        let config = ClientConfig::new().with_base_url("http://localhost:9999");
        let client = EntrezClient::with_config(config);
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[tokio::test]
    async fn test_empty_term_returns_empty_table_without_requests() {
        // Unroutable base URL: any request attempt would fail loudly
        let config = ClientConfig::new().with_base_url("http://127.0.0.1:1");
        let client = EntrezClient::with_config(config);

        let table = client.search("   ").await.unwrap();
        assert!(table.is_empty());
    }
}
