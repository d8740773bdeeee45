//! Client configuration shared by both retrieval paths

use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::retry::RetryConfig;

const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for NCBI access: identification, rate limits, retry policy.
///
/// NCBI asks clients to identify themselves with a contact email and tool
/// name, and grants a higher request rate to API key holders. All fields are
/// optional; the defaults are safe for anonymous use.
///
/// # Example
///
/// ```
/// use pubmed_tools::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_api_key("your_api_key_here")
///     .with_email("researcher@university.edu");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// NCBI API key; raises the allowed request rate from 3/s to 10/s
    pub api_key: Option<String>,
    /// Contact email, sent with every request as NCBI requests
    pub email: Option<String>,
    /// Tool name reported to NCBI; defaults to this crate's name
    pub tool: Option<String>,
    /// Override for the E-utilities base URL (used by tests to point at mocks)
    pub base_url: Option<String>,
    /// Override for the request rate in requests per second
    pub rate_limit: Option<f64>,
    /// HTTP request timeout
    pub timeout: Option<Duration>,
    /// Retry policy for transient transport failures
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: f64) -> Self {
        self.rate_limit = Some(requests_per_second);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Base URL to send E-utilities requests to
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Request rate: explicit override, else 10/s with an API key, else 3/s
    pub fn effective_rate_limit(&self) -> f64 {
        self.rate_limit.unwrap_or(if self.api_key.is_some() {
            10.0
        } else {
            3.0
        })
    }

    /// Tool name reported to NCBI
    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(env!("CARGO_PKG_NAME"))
    }

    /// User-Agent header value
    pub fn effective_user_agent(&self) -> String {
        format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// HTTP timeout
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Build a rate limiter matching this configuration
    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }

    /// Identification parameters appended to every E-utilities request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        params.push(("tool".to_string(), self.effective_tool().to_string()));
        params
    }
}
