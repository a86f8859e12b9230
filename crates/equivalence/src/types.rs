//! Core types for attribute comparison

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default name of the server-assigned identity field stripped from list elements.
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

/// Location of a value inside a record, used to attribute diagnostics.
///
/// Rendered as `name`, `name[2]` or `name["key"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(String);

impl AttributePath {
    /// Path to a top-level attribute
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Path to a list element below this path
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Path to a map entry below this path
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{:?}]", self.0, key))
    }

    /// The rendered path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value under reconciliation
///
/// Every string payload is expected to be an encoded JSON document.
/// Deserializes untagged: a JSON string is a scalar, an array of strings a
/// list, an object of strings a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A single encoded document
    Scalar(String),
    /// An ordered collection of encoded documents
    List(Vec<String>),
    /// Encoded documents keyed by unique, unordered keys
    Map(BTreeMap<String, String>),
}

impl AttributeValue {
    /// Short name of the variant, for display
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, String>> for AttributeValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(value)
    }
}

/// Outcome of comparing a prior value with a proposed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonResult {
    /// Only formatting differs; keep the prior value
    Equivalent,
    /// A real change; propagate the proposed value
    Distinct,
}

impl ComparisonResult {
    /// Check if the values were judged equivalent
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Self::Equivalent)
    }

    /// Check if the values were judged distinct
    pub fn is_distinct(&self) -> bool {
        matches!(self, Self::Distinct)
    }

    pub(crate) fn from_bool(equal: bool) -> Self {
        if equal { Self::Equivalent } else { Self::Distinct }
    }
}

/// How list elements are paired for comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListMatching {
    /// Index `i` of the prior list against index `i` of the proposed list
    #[default]
    Positional,
    /// Pair elements by the value of their identity field
    ///
    /// Elements without an identity value are paired positionally among
    /// themselves. A pure reordering compares equivalent.
    ByIdentity,
}

/// Options for comparisons
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Object field ignored when comparing list elements
    pub identity_field: String,
    /// Pairing policy for list elements
    pub list_matching: ListMatching,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            list_matching: ListMatching::Positional,
        }
    }
}

impl CompareOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity field stripped from list elements
    #[must_use]
    pub fn identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    /// Set the list pairing policy
    #[must_use]
    pub fn list_matching(mut self, matching: ListMatching) -> Self {
        self.list_matching = matching;
        self
    }
}
