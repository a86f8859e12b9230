//! Core types for query aggregation.

use crate::cancel::CancelToken;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Page ceiling used when the caller does not set one.
pub const DEFAULT_MAX_PAGES: u32 = 1;

/// Server-declared classification of a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    /// A single value that never pages.
    Atomic,
    /// An ordered sequence of records, possibly spanning pages.
    Paged,
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic => write!(f, "atomic"),
            Self::Paged => write!(f, "paged"),
        }
    }
}

/// Content of one fetched page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PagePayload {
    /// The whole result of an atomic query.
    Atomic(Value),
    /// One batch of records of a paged query.
    Records(Vec<Value>),
}

/// One batch fetched from the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    /// Page content; its variant is the declared result shape.
    pub payload: PagePayload,
    /// Continuation token; empty or absent means no more pages.
    pub next_cursor: Option<String>,
}

impl QueryPage {
    /// Create an atomic page.
    pub fn atomic(value: Value) -> Self {
        Self {
            payload: PagePayload::Atomic(value),
            next_cursor: None,
        }
    }

    /// Create a page of records.
    pub fn records(records: Vec<Value>, next_cursor: Option<&str>) -> Self {
        Self {
            payload: PagePayload::Records(records),
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    /// Set the continuation token.
    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Shape declared by this page.
    #[must_use]
    pub fn shape(&self) -> ResultShape {
        match self.payload {
            PagePayload::Atomic(_) => ResultShape::Atomic,
            PagePayload::Records(_) => ResultShape::Paged,
        }
    }

    /// Continuation token, if it points at another page.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Shape of an aggregated result as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateShape {
    /// A single atomic value.
    Atomic,
    /// A list of records.
    List,
}

/// Assembled result of a logical query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "payload", rename_all = "lowercase")]
pub enum AggregatePayload {
    /// The atomic value, as returned.
    Atomic(Value),
    /// Records in page-arrival order.
    List(Vec<Value>),
}

/// Outcome of a logical query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Assembled payload.
    #[serde(flatten)]
    pub payload: AggregatePayload,
    /// Number of pages requested from the service.
    pub pages_fetched: usize,
    /// Whether the page ceiling stopped the query while more pages remained.
    pub truncated: bool,
}

impl Aggregate {
    /// Shape of the result.
    #[must_use]
    pub fn shape(&self) -> AggregateShape {
        match self.payload {
            AggregatePayload::Atomic(_) => AggregateShape::Atomic,
            AggregatePayload::List(_) => AggregateShape::List,
        }
    }

    /// Records of a list result, `None` for atomic results.
    #[must_use]
    pub fn records(&self) -> Option<&[Value]> {
        match &self.payload {
            AggregatePayload::List(records) => Some(records),
            AggregatePayload::Atomic(_) => None,
        }
    }
}

/// Options for a logical query.
///
/// # Example
///
/// ```
/// use pagekit::QueryOptions;
///
/// let options = QueryOptions::new().include_removed(true).max_pages(5);
///
/// assert!(options.include_removed);
/// assert_eq!(options.page_limit(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Ask the service to include removed records.
    pub include_removed: bool,
    /// Maximum number of pages to fetch (None = one page).
    pub max_pages: Option<u32>,
    /// Token checked between page fetches.
    pub cancel: Option<CancelToken>,
}

impl QueryOptions {
    /// Create new query options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether removed records are included.
    #[must_use]
    pub fn include_removed(mut self, include: bool) -> Self {
        self.include_removed = include;
        self
    }

    /// Set the page ceiling. Zero is treated as one.
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Effective page ceiling: at least one page is always fetched.
    #[must_use]
    pub fn page_limit(&self) -> usize {
        self.max_pages.unwrap_or(DEFAULT_MAX_PAGES).max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_shape() {
        assert_eq!(QueryPage::atomic(json!(1)).shape(), ResultShape::Atomic);
        assert_eq!(QueryPage::records(vec![], None).shape(), ResultShape::Paged);
    }

    #[test]
    fn test_page_continuation_ignores_empty_cursor() {
        assert_eq!(QueryPage::records(vec![], Some("")).continuation(), None);
        assert_eq!(QueryPage::records(vec![], None).continuation(), None);
        assert_eq!(
            QueryPage::records(vec![], Some("c1")).continuation(),
            Some("c1")
        );
        assert_eq!(
            QueryPage::atomic(json!(null)).with_cursor("c9").continuation(),
            Some("c9")
        );
    }

    #[test]
    fn test_query_options_default() {
        let options = QueryOptions::default();
        assert!(!options.include_removed);
        assert!(options.max_pages.is_none());
        assert!(options.cancel.is_none());
        assert_eq!(options.page_limit(), 1);
    }

    #[test]
    fn test_query_options_zero_pages_means_one() {
        assert_eq!(QueryOptions::new().max_pages(0).page_limit(), 1);
        assert_eq!(QueryOptions::new().max_pages(7).page_limit(), 7);
    }

    #[test]
    fn test_aggregate_accessors() {
        let list = Aggregate {
            payload: AggregatePayload::List(vec![json!(1)]),
            pages_fetched: 1,
            truncated: false,
        };
        assert_eq!(list.shape(), AggregateShape::List);
        assert_eq!(list.records().map(<[Value]>::len), Some(1));

        let atomic = Aggregate {
            payload: AggregatePayload::Atomic(json!({"count": 3})),
            pages_fetched: 1,
            truncated: false,
        };
        assert_eq!(atomic.shape(), AggregateShape::Atomic);
        assert!(atomic.records().is_none());
    }

    #[test]
    fn test_aggregate_serializes_shape_tag() {
        let aggregate = Aggregate {
            payload: AggregatePayload::List(vec![json!("a")]),
            pages_fetched: 2,
            truncated: true,
        };
        let value = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(value["shape"], "list");
        assert_eq!(value["payload"], json!(["a"]));
        assert_eq!(value["pages_fetched"], 2);
        assert_eq!(value["truncated"], true);
    }
}
