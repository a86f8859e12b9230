//! `driftless query` - run a paginated query and print the assembled result

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pagekit::{
    Aggregate, AggregatePayload, Client, FetchError, GraphqlService, QueryOptions, QueryPage,
    QueryService,
};
use std::fs;

use crate::Context;
use crate::cli::QueryArgs;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, config: &Config, args: QueryArgs) -> Result<()> {
    let query = resolve_query(&args.query)?;
    let endpoint = config.endpoint(args.endpoint.as_deref())?;

    let mut options = QueryOptions::new().include_removed(args.include_removed);
    if let Some(max_pages) = args.page_ceiling().or(config.max_pages) {
        options = options.max_pages(max_pages);
    }
    log::info!(
        "Querying {endpoint} (up to {} page(s), include_removed={})",
        options.page_limit(),
        options.include_removed
    );

    let service: Box<dyn QueryService> = match config.timeout(args.timeout) {
        Some(timeout) => Box::new(GraphqlService::with_timeout(endpoint, timeout)),
        None => Box::new(GraphqlService::new(endpoint)),
    };

    let progress = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        spinner()?
    };
    let client = Client::with_service(Box::new(ProgressService::new(service, progress.clone())));

    let result = client.aggregate(&query, options);
    progress.finish_and_clear();

    let aggregate = result.map_err(|err| {
        let category = err.category();
        anyhow::Error::new(err).context(format!("Query failed ({})", category.description()))
    })?;

    print_payload(&aggregate, args.compact)?;
    report(ctx, &aggregate);
    Ok(())
}

/// Resolve query text: `@FILE` reads the file, anything else is the query itself
pub fn resolve_query(raw: &str) -> Result<String> {
    let Some(file) = raw.strip_prefix('@') else {
        return Ok(raw.to_string());
    };
    let path = paths::expand(file);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Could not read query file {}", path.display()))?;
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "Query file {} is empty", path.display());
    Ok(text.to_string())
}

fn spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Fetching page 1");
    Ok(pb)
}

fn print_payload(aggregate: &Aggregate, compact: bool) -> Result<()> {
    let body = match &aggregate.payload {
        AggregatePayload::Atomic(value) => value.clone(),
        AggregatePayload::List(records) => serde_json::Value::Array(records.clone()),
    };
    let text = if compact {
        serde_json::to_string(&body)?
    } else {
        serde_json::to_string_pretty(&body)?
    };
    println!("{text}");
    Ok(())
}

fn report(ctx: &Context, aggregate: &Aggregate) {
    if ctx.quiet {
        return;
    }
    let records = aggregate
        .records()
        .map_or_else(|| "atomic result".to_string(), |r| format!("{} record(s)", r.len()));
    eprintln!("{records} from {} page(s)", aggregate.pages_fetched);
    if aggregate.truncated {
        ui::warn("Stopped at the page limit; more results are available (raise --max-pages)");
    }
}

/// Query service wrapper that ticks a spinner for every page fetched
struct ProgressService {
    inner: Box<dyn QueryService>,
    progress: ProgressBar,
}

impl ProgressService {
    fn new(inner: Box<dyn QueryService>, progress: ProgressBar) -> Self {
        Self { inner, progress }
    }
}

impl QueryService for ProgressService {
    fn fetch_page(
        &self,
        query: &str,
        include_removed: bool,
        cursor: &str,
    ) -> Result<QueryPage, FetchError> {
        self.progress.tick();
        let page = self.inner.fetch_page(query, include_removed, cursor)?;
        self.progress.inc(1);
        self.progress
            .set_message(format!("Fetching page {}", self.progress.position() + 1));
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit::{AggregateShape, MockService};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_inline_query() {
        assert_eq!(resolve_query("{ count }").unwrap(), "{ count }");
    }

    #[test]
    fn test_resolve_query_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitors.graphql");
        fs::write(&path, "\n{ result: monitors { id } }\n\n").unwrap();

        let query = resolve_query(&format!("@{}", path.display())).unwrap();
        assert_eq!(query, "{ result: monitors { id } }");
    }

    #[test]
    fn test_resolve_empty_query_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.graphql");
        fs::write(&path, "  \n").unwrap();

        let err = resolve_query(&format!("@{}", path.display())).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_resolve_missing_query_file() {
        let dir = TempDir::new().unwrap();
        let raw = format!("@{}", dir.path().join("missing.graphql").display());
        assert!(resolve_query(&raw).is_err());
    }

    #[test]
    fn test_progress_service_counts_pages() {
        let mock = MockService::with_pages(vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]]);
        let progress = ProgressBar::hidden();
        let client = Client::with_service(Box::new(ProgressService::new(
            Box::new(mock.clone()),
            progress.clone(),
        )));

        let aggregate = client.aggregate("q", QueryOptions::new().max_pages(2)).unwrap();

        assert_eq!(aggregate.shape(), AggregateShape::List);
        assert_eq!(aggregate.pages_fetched, 2);
        assert!(aggregate.truncated);
        assert_eq!(progress.position(), 2);
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn test_progress_service_passes_errors_through() {
        let mock = MockService::with_pages(vec![vec![json!(1)], vec![json!(2)]]);
        mock.fail_at("c1", FetchError::http("HTTP 503", Some(503)));
        let progress = ProgressBar::hidden();
        let client = Client::with_service(Box::new(ProgressService::new(
            Box::new(mock.clone()),
            progress.clone(),
        )));

        let err = client.aggregate("q", QueryOptions::new().max_pages(5)).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(progress.position(), 1);
    }

    #[test]
    fn test_spinner_template_is_valid() {
        assert!(spinner().is_ok());
    }
}
