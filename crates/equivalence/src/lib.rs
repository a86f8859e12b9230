//! # Equivalence
//!
//! Decide whether a proposed attribute value really differs from the
//! last-known one, or only differs in formatting.
//!
//! Reconciliation engines compare the value they remember with a freshly
//! computed one. When both are encoded JSON, textual differences (key order,
//! whitespace, `1` vs `1.0`, server-assigned ids) would otherwise show up as
//! a change on every pass. This crate parses both sides into canonical trees,
//! compares them structurally, and keeps the prior value when nothing real
//! changed.
//!
//! ## Core Concepts
//!
//! - **AttributeValue**: a scalar, list or map of encoded JSON documents
//! - **ComparisonResult**: `Equivalent` (suppress) or `Distinct` (propagate)
//! - **CompareOptions**: identity field and list pairing policy
//! - **RecordPlan**: suppression applied to every attribute of a record
//!
//! ## Example
//!
//! ```
//! use equivalence::{suppress_if_equivalent, AttributePath, AttributeValue, CompareOptions};
//!
//! let prior = AttributeValue::from(r#"{"a":1,"b":[1,2,3]}"#);
//! let proposed = AttributeValue::from(r#"{"b":[1,2,3],"a":1.0}"#);
//!
//! let emitted = suppress_if_equivalent(
//!     &AttributePath::new("policy"),
//!     prior.clone(),
//!     proposed,
//!     &CompareOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(emitted, prior);
//! ```

pub mod canonical;
pub mod compare;
pub mod error;
pub mod plan;
pub mod types;

// Re-export main types at crate root
pub use canonical::{normalize, CanonicalValue};
pub use compare::{compare, compare_list, compare_map, compare_scalar, suppress_if_equivalent};
pub use error::{Error, Result, Side};
pub use plan::{plan_record, AttributeDiff, ChangeKind, DiffSummary, Record, RecordPlan};
pub use types::{
    AttributePath, AttributeValue, CompareOptions, ComparisonResult, ListMatching,
    DEFAULT_IDENTITY_FIELD,
};
