//! Error types for equivalence checks.

use crate::types::AttributePath;
use std::fmt;

/// Result type alias for equivalence operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a comparison a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The last-known value.
    Prior,
    /// The newly proposed value.
    Proposed,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prior => write!(f, "prior"),
            Self::Proposed => write!(f, "proposed"),
        }
    }
}

/// Errors raised while comparing attribute values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A payload expected to be JSON failed to parse.
    #[error("malformed {side} payload at {path}: {source}")]
    MalformedPayload {
        /// Attribute path of the failing value.
        path: AttributePath,
        /// Which side failed to parse.
        side: Side,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a malformed payload error.
    pub fn malformed(path: &AttributePath, side: Side, source: serde_json::Error) -> Self {
        Self::MalformedPayload {
            path: path.clone(),
            side,
            source,
        }
    }

    /// Attribute path the error is attributed to.
    #[must_use]
    pub fn path(&self) -> &AttributePath {
        match self {
            Self::MalformedPayload { path, .. } => path,
        }
    }

    /// Side of the comparison that failed.
    #[must_use]
    pub fn side(&self) -> Side {
        match self {
            Self::MalformedPayload { side, .. } => *side,
        }
    }
}
