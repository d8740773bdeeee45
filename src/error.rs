use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Error types for PubMed retrieval operations
#[derive(Error, Debug)]
pub enum PubMedError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// MEDLINE record parsing failed
    #[error("MEDLINE parsing failed: {message}")]
    MedlineParseError { message: String },

    /// The search matched more results than the Entrez API path supports
    #[error(
        "search matched {matched} results, exceeding the supported maximum of {maximum}; \
         use the EDirect client for larger result sets"
    )]
    ResultLimitExceeded { matched: usize, maximum: usize },

    /// The EDirect client was invoked on a host it cannot run on
    #[error("unsupported operating system for EDirect: {os}")]
    UnsupportedPlatform { os: String },

    /// The EDirect toolkit is not installed in the expected folder
    #[error("EDirect not found at {path}; run EDirectInstaller::prepare first")]
    EDirectNotInstalled { path: String },

    /// An external command exited unsuccessfully
    #[error("{program} failed: {message}")]
    CommandFailed { program: String, message: String },

    /// ESearch returned results without a history server session
    #[error("NCBI did not return a WebEnv history session")]
    WebEnvNotAvailable,

    /// API rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    /// Generic API error with HTTP status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// IO error for file operations
    #[error("IO error: {message}")]
    IoError { message: String },
}

pub type Result<T> = result::Result<T, PubMedError>;

impl RetryableError for PubMedError {
    fn is_retryable(&self) -> bool {
        match self {
            // Network errors are typically transient
            PubMedError::RequestError(err) => {
                if err.is_timeout() || err.is_connect() {
                    return true;
                }

                // Server errors (5xx) and rate limiting (429)
                if let Some(status) = err.status() {
                    return status.is_server_error() || status.as_u16() == 429;
                }

                // DNS and other network errors
                !err.is_builder() && !err.is_redirect() && !err.is_decode()
            }

            // Rate limiting should be retried after delay
            PubMedError::RateLimitExceeded => true,

            PubMedError::ApiError { status, .. } => {
                (*status >= 500 && *status < 600) || *status == 429
            }

            // All other errors are not retryable
            PubMedError::JsonError(_)
            | PubMedError::MedlineParseError { .. }
            | PubMedError::ResultLimitExceeded { .. }
            | PubMedError::UnsupportedPlatform { .. }
            | PubMedError::EDirectNotInstalled { .. }
            | PubMedError::CommandFailed { .. }
            | PubMedError::WebEnvNotAvailable
            | PubMedError::IoError { .. } => false,
        }
    }

    fn retry_reason(&self) -> &str {
        match self {
            PubMedError::RequestError(err) if err.is_timeout() => "Request timeout",
            PubMedError::RequestError(err) if err.is_connect() => "Connection error",
            PubMedError::RequestError(_) => "Network error",
            PubMedError::RateLimitExceeded => "Rate limit exceeded",
            PubMedError::ApiError { status, .. } => match status {
                429 => "Rate limit exceeded",
                500..=599 => "Server error",
                _ => "Temporary API error",
            },
            _ => "Non-transient error",
        }
    }
}
