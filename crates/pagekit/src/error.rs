//! Error types for query aggregation.
//!
//! [`FetchError`] is what a query service reports for a single page request.
//! [`Error`] is what the aggregator reports for a whole logical query, with
//! the page number and cursor that were in flight. Errors are categorized so
//! callers that own a retry policy can decide what to do; the aggregator
//! itself never retries.

use crate::types::ResultShape;
use std::fmt;

/// Result type alias for aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of aggregation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-level failure reaching the service (transient).
    Transport,
    /// The service answered with an error.
    Remote,
    /// The service broke the result shape contract.
    Contract,
    /// The caller cancelled the query.
    Cancelled,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the query service",
            Self::Remote => "Query service returned an error",
            Self::Contract => "Query service broke the result shape contract",
            Self::Cancelled => "Query cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Failure of a single page request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The query itself was rejected.
    #[error("query rejected: {}", .0.join("; "))]
    Query(Vec<String>),

    /// Invalid response from the service.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { status: None, .. } => ErrorCategory::Transport,
            Self::Http {
                status: Some(code), ..
            } if *code == 429 || *code >= 500 => ErrorCategory::Transport,
            Self::Http { .. } | Self::Query(_) | Self::InvalidResponse(_) => ErrorCategory::Remote,
        }
    }
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Errors that end a logical query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query service call failed; propagated unchanged.
    #[error("fetching page {page} (cursor {cursor:?}) failed: {source}")]
    RemoteFetchFailure {
        /// 1-based number of the page being fetched.
        page: usize,
        /// Cursor the request was made with.
        cursor: String,
        /// Underlying failure.
        #[source]
        source: FetchError,
    },

    /// The result shape changed between pages of the same query.
    #[error("page {page} (cursor {cursor:?}) returned a {found} result, expected {expected}")]
    ShapeContractViolation {
        /// 1-based number of the offending page.
        page: usize,
        /// Cursor the offending page was fetched with.
        cursor: String,
        /// Shape declared by the first page.
        expected: ResultShape,
        /// Shape declared by the offending page.
        found: ResultShape,
    },

    /// Cancellation was observed between page fetches.
    #[error("query cancelled after {pages_fetched} page(s), before cursor {cursor:?}")]
    CancelledByCaller {
        /// Pages fetched before cancellation.
        pages_fetched: usize,
        /// Cursor that would have been requested next.
        cursor: String,
    },
}

impl Error {
    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RemoteFetchFailure { source, .. } => source.category(),
            Self::ShapeContractViolation { .. } => ErrorCategory::Contract,
            Self::CancelledByCaller { .. } => ErrorCategory::Cancelled,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
