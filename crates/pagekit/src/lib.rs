//! # pagekit
//!
//! Aggregate cursor-paginated query results into one logical result.
//!
//! This crate provides functionality for:
//! - Running a query against a remote query service page by page
//! - Honoring the server-declared result shape (atomic results never page)
//! - Stopping at a terminal cursor or a caller-supplied page ceiling
//! - Cooperative cancellation between page fetches
//!
//! ## Example
//!
//! ```no_run
//! use pagekit::{Client, GraphqlService, QueryOptions};
//!
//! let client = Client::with_service(Box::new(GraphqlService::new(
//!     "https://api.example.com/graphql",
//! )));
//!
//! let result = client
//!     .aggregate("{ result: monitors { id name } }", QueryOptions::new().max_pages(10))
//!     .expect("query failed");
//!
//! if let Some(records) = result.records() {
//!     println!("{} records over {} pages", records.len(), result.pages_fetched);
//! }
//! ```
//!
//! ## Termination rules
//!
//! | First page shape | Stops when                                   | Reported as |
//! |------------------|----------------------------------------------|-------------|
//! | atomic           | immediately                                  | atomic      |
//! | paged            | cursor empty, or `max_pages` pages fetched   | list        |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod cancel;
pub mod error;
pub mod service;
pub mod types;

pub use aggregate::aggregate;
pub use cancel::CancelToken;
pub use error::{Error, ErrorCategory, FetchError, Result};
pub use service::graphql::GraphqlService;
pub use service::{MockService, QueryService};
pub use types::{
    Aggregate, AggregatePayload, AggregateShape, PagePayload, QueryOptions, QueryPage,
    ResultShape, DEFAULT_MAX_PAGES,
};

/// High-level client for logical queries.
///
/// # Example
///
/// ```
/// use pagekit::{Client, MockService, QueryOptions};
/// use serde_json::json;
///
/// let client = Client::with_service(Box::new(MockService::with_atomic(json!(3))));
/// let result = client.aggregate("{ count }", QueryOptions::default()).unwrap();
/// assert!(result.records().is_none());
/// ```
pub struct Client {
    service: Box<dyn QueryService>,
}

impl Client {
    /// Create a client over any query service.
    #[must_use]
    pub fn with_service(service: Box<dyn QueryService>) -> Self {
        Self { service }
    }

    /// Run a logical query.
    ///
    /// See [`aggregate()`] for the termination rules and errors.
    pub fn aggregate(&self, query: &str, options: QueryOptions) -> Result<Aggregate> {
        aggregate(self.service.as_ref(), query, &options)
    }
}
