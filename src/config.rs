//! User configuration (`config.toml`)
//!
//! Every key is optional; command-line flags take precedence over the file.
//!
//! ```toml
//! endpoint = "https://api.example.com/graphql"
//! max_pages = 10
//! timeout_secs = 30
//! identity_field = "id"
//! match_by_id = false
//! ```

use crate::paths;
use anyhow::{Context, Result};
use equivalence::{CompareOptions, ListMatching};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GraphQL endpoint for `query`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Default page ceiling for `query`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    /// Per-call deadline for the query service, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Identity field stripped from list elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_field: Option<String>,
    /// Match list elements by identity instead of position
    #[serde(default)]
    pub match_by_id: bool,
}

impl Config {
    /// Load the config file, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        let path = paths::config_file()?;
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load a config file from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Comparison options, with command-line overrides applied
    pub fn compare_options(&self, identity_field: Option<&str>, match_by_id: bool) -> CompareOptions {
        let mut options = CompareOptions::default();
        if let Some(field) = identity_field.or(self.identity_field.as_deref()) {
            options = options.identity_field(field);
        }
        if match_by_id || self.match_by_id {
            options = options.list_matching(ListMatching::ByIdentity);
        }
        options
    }

    /// Endpoint to query, with a command-line override applied
    pub fn endpoint(&self, cli: Option<&str>) -> Result<String> {
        cli.map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .context("No query endpoint: pass --endpoint, set DRIFTLESS_ENDPOINT, or add `endpoint` to config.toml")
    }

    /// Per-call deadline, if configured
    pub fn timeout(&self, cli_secs: Option<u64>) -> Option<Duration> {
        cli_secs.or(self.timeout_secs).map(Duration::from_secs)
    }
}
