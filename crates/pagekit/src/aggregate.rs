//! Aggregation of paged query results.
//!
//! One logical query runs as a strictly sequential loop: each request needs
//! the cursor returned by the previous one. An atomic first page ends the
//! query at once. A paged query ends on an empty cursor or at the page
//! ceiling, and a ceiling stop is a normal, truncated success.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::service::QueryService;
use crate::types::{Aggregate, AggregatePayload, PagePayload, QueryOptions, ResultShape};
use serde_json::Value;

/// Accumulator for one logical query. Never outlives the call.
struct AggregationState {
    records: Vec<Value>,
    cursor: String,
    pages_fetched: usize,
}

impl AggregationState {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            cursor: String::new(),
            pages_fetched: 0,
        }
    }

    fn finish(self, truncated: bool) -> Aggregate {
        Aggregate {
            payload: AggregatePayload::List(self.records),
            pages_fetched: self.pages_fetched,
            truncated,
        }
    }
}

/// Run a logical query to completion.
///
/// # Errors
///
/// - [`Error::RemoteFetchFailure`] when a page request fails; nothing
///   fetched so far is returned.
/// - [`Error::ShapeContractViolation`] when a later page declares a
///   different result shape than the first.
/// - [`Error::CancelledByCaller`] when the options' token is raised
///   between page fetches.
pub fn aggregate(
    service: &dyn QueryService,
    query: &str,
    options: &QueryOptions,
) -> Result<Aggregate> {
    let limit = options.page_limit();
    let mut state = AggregationState::new();

    loop {
        if state.pages_fetched > 0 && options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            log::debug!("query cancelled after {} page(s)", state.pages_fetched);
            return Err(Error::CancelledByCaller {
                pages_fetched: state.pages_fetched,
                cursor: state.cursor,
            });
        }

        let page_number = state.pages_fetched + 1;
        let page = service
            .fetch_page(query, options.include_removed, &state.cursor)
            .map_err(|source| Error::RemoteFetchFailure {
                page: page_number,
                cursor: state.cursor.clone(),
                source,
            })?;
        let continuation = page.continuation().map(str::to_string);

        match page.payload {
            PagePayload::Atomic(value) if state.pages_fetched == 0 => {
                log::debug!("atomic result, not paging");
                return Ok(Aggregate {
                    payload: AggregatePayload::Atomic(value),
                    pages_fetched: 1,
                    truncated: false,
                });
            }
            PagePayload::Atomic(_) => {
                return Err(Error::ShapeContractViolation {
                    page: page_number,
                    cursor: state.cursor,
                    expected: ResultShape::Paged,
                    found: ResultShape::Atomic,
                });
            }
            PagePayload::Records(records) => {
                state.pages_fetched = page_number;
                log::debug!(
                    "page {}: {} record(s), next cursor {:?}",
                    page_number,
                    records.len(),
                    continuation
                );
                state.records.extend(records);
            }
        }

        match continuation {
            None => return Ok(state.finish(false)),
            Some(_) if state.pages_fetched >= limit => {
                log::debug!("page ceiling of {} reached, result truncated", limit);
                return Ok(state.finish(true));
            }
            Some(next) => state.cursor = next,
        }
    }
}
