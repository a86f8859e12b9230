//! GraphQL query service.
//!
//! This module provides the [`GraphqlService`] implementation, which posts
//! queries to a GraphQL endpoint over HTTP.
//!
//! # Wire format
//!
//! Requests carry the query text and two variables:
//!
//! ```json
//! {"query": "...", "variables": {"includeRemoved": false, "cursor": ""}}
//! ```
//!
//! The response's `data.result` object declares its shape with `kind`:
//!
//! ```json
//! {"data": {"result": {"kind": "paged", "records": [...], "nextCursor": "c1"}}}
//! {"data": {"result": {"kind": "atomic", "value": {...}}}}
//! ```
//!
//! A non-empty `errors` array fails the request.

use crate::error::FetchError;
use crate::service::QueryService;
use crate::types::QueryPage;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// GraphQL query service.
///
/// # Example
///
/// ```no_run
/// use pagekit::service::QueryService;
/// use pagekit::service::graphql::GraphqlService;
///
/// let service = GraphqlService::new("https://api.example.com/graphql");
/// let page = service.fetch_page("{ result: monitors { id } }", false, "").unwrap();
/// println!("next cursor: {:?}", page.continuation());
/// ```
pub struct GraphqlService {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// GraphQL endpoint URL.
    endpoint: String,
}

impl GraphqlService {
    /// Create a service for an endpoint with no per-call deadline.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a service whose every call is bounded by `timeout`.
    #[must_use]
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Build the request body for one page.
fn request_body(query: &str, include_removed: bool, cursor: &str) -> Value {
    json!({
        "query": query,
        "variables": {
            "includeRemoved": include_removed,
            "cursor": cursor,
        },
    })
}

impl QueryService for GraphqlService {
    fn fetch_page(
        &self,
        query: &str,
        include_removed: bool,
        cursor: &str,
    ) -> Result<QueryPage, FetchError> {
        log::trace!("POST {} cursor={:?}", self.endpoint, cursor);

        let response: GraphqlResponse = self
            .agent
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("User-Agent", "pagekit-rs")
            .send_json(request_body(query, include_removed, cursor))?
            .body_mut()
            .read_json()?;

        response.into_page()
    }
}

// =============================================================================
// GraphQL response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    result: Option<WireResult>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum WireResult {
    Atomic {
        #[serde(default)]
        value: Value,
        #[serde(rename = "nextCursor", default)]
        next_cursor: Option<String>,
    },
    Paged {
        #[serde(default)]
        records: Vec<Value>,
        #[serde(rename = "nextCursor", default)]
        next_cursor: Option<String>,
    },
}

impl GraphqlResponse {
    fn into_page(self) -> Result<QueryPage, FetchError> {
        if !self.errors.is_empty() {
            return Err(FetchError::Query(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        let result = self
            .data
            .and_then(|d| d.result)
            .ok_or_else(|| FetchError::InvalidResponse("missing data.result".to_string()))?;

        Ok(result.into())
    }
}

impl From<WireResult> for QueryPage {
    fn from(result: WireResult) -> Self {
        match result {
            WireResult::Atomic { value, next_cursor } => Self {
                next_cursor,
                ..Self::atomic(value)
            },
            WireResult::Paged {
                records,
                next_cursor,
            } => Self::records(records, next_cursor.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PagePayload, ResultShape};

    fn decode(body: &str) -> Result<QueryPage, FetchError> {
        let response: GraphqlResponse = serde_json::from_str(body)?;
        response.into_page()
    }

    #[test]
    fn test_request_body() {
        let body = request_body("{ items }", true, "c3");
        assert_eq!(body["query"], "{ items }");
        assert_eq!(body["variables"]["includeRemoved"], true);
        assert_eq!(body["variables"]["cursor"], "c3");
    }

    #[test]
    fn test_endpoint() {
        let service = GraphqlService::new("https://api.example.com/graphql");
        assert_eq!(service.endpoint(), "https://api.example.com/graphql");

        let service =
            GraphqlService::with_timeout("http://localhost:8080/q", Duration::from_secs(5));
        assert_eq!(service.endpoint(), "http://localhost:8080/q");
    }

    #[test]
    fn test_decode_paged() {
        let page = decode(
            r#"{"data":{"result":{"kind":"paged","records":[{"id":1},{"id":2}],"nextCursor":"c1"}}}"#,
        )
        .unwrap();
        assert_eq!(page.shape(), ResultShape::Paged);
        assert_eq!(page.continuation(), Some("c1"));
        match page.payload {
            PagePayload::Records(records) => assert_eq!(records.len(), 2),
            PagePayload::Atomic(_) => panic!("Expected records"),
        }
    }

    #[test]
    fn test_decode_paged_last_page() {
        let page =
            decode(r#"{"data":{"result":{"kind":"paged","records":[],"nextCursor":null}}}"#)
                .unwrap();
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn test_decode_atomic_keeps_cursor_but_shape_is_atomic() {
        let page = decode(
            r#"{"data":{"result":{"kind":"atomic","value":{"count":7},"nextCursor":"ignored"}}}"#,
        )
        .unwrap();
        assert_eq!(page.shape(), ResultShape::Atomic);
        assert_eq!(page.payload, PagePayload::Atomic(json!({"count": 7})));
    }

    #[test]
    fn test_decode_errors() {
        let err = decode(r#"{"data":null,"errors":[{"message":"unknown field"}]}"#).unwrap_err();
        assert_eq!(err, FetchError::Query(vec!["unknown field".to_string()]));
    }

    #[test]
    fn test_decode_missing_result() {
        let err = decode(r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let err = decode(r#"{"data":{"result":{"kind":"stream"}}}"#).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }
}
