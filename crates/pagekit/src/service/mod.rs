//! Query service traits and implementations.
//!
//! This module provides the [`QueryService`] trait and implementations for
//! different remote sources. The primary implementation is
//! [`graphql::GraphqlService`] for GraphQL endpoints over HTTP.
//!
//! # Testing
//!
//! Use [`MockService`] for testing without network access:
//!
//! ```
//! use pagekit::service::{MockService, QueryService};
//! use serde_json::json;
//!
//! let mock = MockService::with_pages(vec![vec![json!(1), json!(2)], vec![json!(3)]]);
//!
//! let first = mock.fetch_page("{ items }", false, "").unwrap();
//! assert_eq!(first.continuation(), Some("c1"));
//! assert_eq!(mock.call_count(), 1);
//! ```

pub mod graphql;

use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::types::QueryPage;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Remote query service.
///
/// Each call fetches one page. Implementations must report the same result
/// shape for every page of one logical query, and must be safe to share
/// across threads. Retries, if any, belong inside the implementation.
pub trait QueryService: Send + Sync {
    /// Fetch one page of results.
    ///
    /// An empty `cursor` requests the first page.
    fn fetch_page(
        &self,
        query: &str,
        include_removed: bool,
        cursor: &str,
    ) -> Result<QueryPage, FetchError>;
}

/// A request recorded by [`MockService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Query text.
    pub query: String,
    /// Include-removed flag.
    pub include_removed: bool,
    /// Cursor requested.
    pub cursor: String,
}

/// Mock service for testing without network access.
///
/// Pages are scripted per cursor and every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<String, Result<QueryPage, FetchError>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    cancel_after: Arc<Mutex<Option<(usize, CancelToken)>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockService {
    /// Create a new empty mock service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock serving a paged query.
    ///
    /// Page `i` (0-based) is served for cursor `""` when `i == 0` and `c{i}`
    /// otherwise, and points at `c{i+1}`; the last page has no cursor.
    #[must_use]
    pub fn with_pages(pages: Vec<Vec<Value>>) -> Self {
        let mock = Self::new();
        let count = pages.len();
        for (i, records) in pages.into_iter().enumerate() {
            let next = (i + 1 < count).then(|| format!("c{}", i + 1));
            mock.add_page(page_cursor(i), QueryPage::records(records, next.as_deref()));
        }
        mock
    }

    /// Create a mock serving an atomic query.
    #[must_use]
    pub fn with_atomic(value: Value) -> Self {
        let mock = Self::new();
        mock.add_page("", QueryPage::atomic(value));
        mock
    }

    /// Serve `page` when `cursor` is requested.
    pub fn add_page(&self, cursor: impl Into<String>, page: QueryPage) {
        lock(&self.responses).insert(cursor.into(), Ok(page));
    }

    /// Fail when `cursor` is requested.
    pub fn fail_at(&self, cursor: impl Into<String>, error: FetchError) {
        lock(&self.responses).insert(cursor.into(), Err(error));
    }

    /// Raise `token` once `calls` requests have been served.
    pub fn cancel_after(&self, calls: usize, token: CancelToken) {
        *lock(&self.cancel_after) = Some((calls, token));
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

/// Cursor under which [`MockService::with_pages`] serves page `index`.
fn page_cursor(index: usize) -> String {
    if index == 0 {
        String::new()
    } else {
        format!("c{}", index)
    }
}

impl QueryService for MockService {
    fn fetch_page(
        &self,
        query: &str,
        include_removed: bool,
        cursor: &str,
    ) -> Result<QueryPage, FetchError> {
        let served = {
            let mut calls = lock(&self.calls);
            calls.push(MockCall {
                query: query.to_string(),
                include_removed,
                cursor: cursor.to_string(),
            });
            calls.len()
        };

        if let Some((after, token)) = lock(&self.cancel_after).as_ref() {
            if served >= *after {
                token.cancel();
            }
        }

        lock(&self.responses)
            .get(cursor)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::InvalidResponse(format!(
                    "mock page not configured for cursor {:?}",
                    cursor
                )))
            })
    }
}
