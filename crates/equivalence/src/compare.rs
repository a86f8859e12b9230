//! Semantic comparison of prior and proposed attribute values
//!
//! Each comparison parses both sides into canonical trees and checks
//! structural equality. Absent values are never equivalent to present ones,
//! and a payload that fails to parse is an error rather than a verdict.

use crate::canonical::{self, CanonicalValue};
use crate::error::{Error, Result, Side};
use crate::types::{AttributePath, AttributeValue, CompareOptions, ComparisonResult, ListMatching};
use std::collections::{BTreeMap, HashMap};

/// Compare two scalar payloads
///
/// `None` or an empty string on either side means the value is absent or not
/// yet known, which is always `Distinct` and is decided without parsing.
pub fn compare_scalar(
    path: &AttributePath,
    prior: Option<&str>,
    proposed: Option<&str>,
) -> Result<ComparisonResult> {
    let (Some(prior), Some(proposed)) = (present(prior), present(proposed)) else {
        return Ok(ComparisonResult::Distinct);
    };

    let prior = parse_side(path, Side::Prior, prior)?;
    let proposed = parse_side(path, Side::Proposed, proposed)?;
    Ok(ComparisonResult::from_bool(prior == proposed))
}

/// Compare two lists of payloads
///
/// A length change is always `Distinct`. Otherwise elements are paired
/// according to `options.list_matching` and compared with the identity field
/// removed, so server-assigned ids never block equivalence. Stops at the
/// first distinct pair.
pub fn compare_list(
    path: &AttributePath,
    prior: &[String],
    proposed: &[String],
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    if prior.len() != proposed.len() {
        log::debug!(
            "{}: length changed ({} -> {})",
            path,
            prior.len(),
            proposed.len()
        );
        return Ok(ComparisonResult::Distinct);
    }

    match options.list_matching {
        ListMatching::Positional => compare_positional(path, prior, proposed, options),
        ListMatching::ByIdentity => compare_by_identity(path, prior, proposed, options),
    }
}

/// Compare two maps of payloads
///
/// Any added or removed key is `Distinct`; shared keys are compared as
/// scalars. Stops at the first difference.
pub fn compare_map(
    path: &AttributePath,
    prior: &BTreeMap<String, String>,
    proposed: &BTreeMap<String, String>,
) -> Result<ComparisonResult> {
    let mut consumed = 0;

    for (key, proposed_value) in proposed {
        let Some(prior_value) = prior.get(key) else {
            log::debug!("{}: key {:?} added", path, key);
            return Ok(ComparisonResult::Distinct);
        };
        consumed += 1;

        let result = compare_scalar(
            &path.key(key),
            Some(prior_value.as_str()),
            Some(proposed_value.as_str()),
        )?;
        if result.is_distinct() {
            return Ok(ComparisonResult::Distinct);
        }
    }

    if consumed < prior.len() {
        log::debug!("{}: {} key(s) removed", path, prior.len() - consumed);
        return Ok(ComparisonResult::Distinct);
    }

    Ok(ComparisonResult::Equivalent)
}

/// Compare two attribute values of any variant
///
/// Values of different variants are always `Distinct`.
pub fn compare(
    path: &AttributePath,
    prior: &AttributeValue,
    proposed: &AttributeValue,
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    match (prior, proposed) {
        (AttributeValue::Scalar(a), AttributeValue::Scalar(b)) => {
            compare_scalar(path, Some(a.as_str()), Some(b.as_str()))
        }
        (AttributeValue::List(a), AttributeValue::List(b)) => compare_list(path, a, b, options),
        (AttributeValue::Map(a), AttributeValue::Map(b)) => compare_map(path, a, b),
        _ => {
            log::debug!(
                "{}: kind changed ({} -> {})",
                path,
                prior.kind(),
                proposed.kind()
            );
            Ok(ComparisonResult::Distinct)
        }
    }
}

/// Pick the value to emit for an attribute
///
/// Returns `prior` when the two values are equivalent, keeping the
/// reconciliation output stable, and `proposed` otherwise.
pub fn suppress_if_equivalent(
    path: &AttributePath,
    prior: AttributeValue,
    proposed: AttributeValue,
    options: &CompareOptions,
) -> Result<AttributeValue> {
    if compare(path, &prior, &proposed, options)?.is_equivalent() {
        log::debug!("{}: suppressing formatting-only diff", path);
        Ok(prior)
    } else {
        Ok(proposed)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_side(path: &AttributePath, side: Side, text: &str) -> Result<CanonicalValue> {
    canonical::parse(text).map_err(|e| Error::malformed(path, side, e))
}

/// Parse a list element with its identity field removed
fn parse_element(
    path: &AttributePath,
    side: Side,
    text: &str,
    identity_field: &str,
) -> Result<(Option<CanonicalValue>, CanonicalValue)> {
    let mut value = parse_side(path, side, text)?;
    let identity = value.strip_field(identity_field);
    Ok((identity, value))
}

fn compare_positional(
    path: &AttributePath,
    prior: &[String],
    proposed: &[String],
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    for (i, (a, b)) in prior.iter().zip(proposed).enumerate() {
        let element_path = path.index(i);
        let (Some(a), Some(b)) = (present(Some(a.as_str())), present(Some(b.as_str()))) else {
            return Ok(ComparisonResult::Distinct);
        };

        let (_, a) = parse_element(&element_path, Side::Prior, a, &options.identity_field)?;
        let (_, b) = parse_element(&element_path, Side::Proposed, b, &options.identity_field)?;
        if a != b {
            log::debug!("{}: element differs", element_path);
            return Ok(ComparisonResult::Distinct);
        }
    }

    Ok(ComparisonResult::Equivalent)
}

/// Elements of one side, split by whether they carry an identity value
struct IndexedSide {
    by_identity: HashMap<CanonicalValue, CanonicalValue>,
    anonymous: Vec<CanonicalValue>,
}

impl IndexedSide {
    /// Index a list; `None` if an identity value appears twice
    fn build(
        path: &AttributePath,
        side: Side,
        items: &[String],
        identity_field: &str,
    ) -> Result<Option<Self>> {
        let mut indexed = Self {
            by_identity: HashMap::new(),
            anonymous: Vec::new(),
        };

        for (i, text) in items.iter().enumerate() {
            let (identity, value) = parse_element(&path.index(i), side, text, identity_field)?;
            match identity {
                Some(identity) => {
                    if indexed.by_identity.insert(identity, value).is_some() {
                        return Ok(None);
                    }
                }
                None => indexed.anonymous.push(value),
            }
        }

        Ok(Some(indexed))
    }
}

fn compare_by_identity(
    path: &AttributePath,
    prior: &[String],
    proposed: &[String],
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    if prior.iter().chain(proposed).any(String::is_empty) {
        return Ok(ComparisonResult::Distinct);
    }

    let field = options.identity_field.as_str();
    let prior_index = IndexedSide::build(path, Side::Prior, prior, field)?;
    let proposed_index = IndexedSide::build(path, Side::Proposed, proposed, field)?;

    let (Some(prior_index), Some(proposed_index)) = (prior_index, proposed_index) else {
        log::debug!("{}: duplicate identity values, matching by position", path);
        return compare_positional(path, prior, proposed, options);
    };

    if prior_index.by_identity.len() != proposed_index.by_identity.len() {
        return Ok(ComparisonResult::Distinct);
    }

    for (identity, value) in &proposed_index.by_identity {
        match prior_index.by_identity.get(identity) {
            Some(prior_value) if prior_value == value => {}
            _ => return Ok(ComparisonResult::Distinct),
        }
    }

    Ok(ComparisonResult::from_bool(
        prior_index.anonymous == proposed_index.anonymous,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> AttributePath {
        AttributePath::new("attr")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn scalar(a: &str, b: &str) -> ComparisonResult {
        compare_scalar(&path(), Some(a), Some(b)).unwrap()
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    #[test]
    fn test_scalar_key_order_and_numeric_form() {
        assert_eq!(
            scalar(r#"{"a":1,"b":[1,2,3]}"#, r#"{"b":[1,2,3],"a":1.0}"#),
            ComparisonResult::Equivalent
        );
    }

    #[test]
    fn test_scalar_whitespace_only_difference() {
        assert_eq!(
            scalar(r#"{"a": [1, 2]}"#, "{\n  \"a\": [1,2]\n}"),
            ComparisonResult::Equivalent
        );
    }

    #[test]
    fn test_scalar_real_change() {
        assert_eq!(scalar(r#"{"a":1}"#, r#"{"a":2}"#), ComparisonResult::Distinct);
        assert_eq!(scalar("[1,2]", "[2,1]"), ComparisonResult::Distinct);
        assert_eq!(scalar(r#""1""#, "1"), ComparisonResult::Distinct);
    }

    #[test]
    fn test_scalar_symmetry() {
        let pairs = [
            (r#"{"a":1}"#, r#"{"a":1.0}"#),
            (r#"{"a":1}"#, r#"{"a":2}"#),
            ("[1,2]", "[2,1]"),
            ("null", "false"),
        ];
        for (a, b) in pairs {
            assert_eq!(scalar(a, b), scalar(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_scalar_absent_is_distinct_without_parsing() {
        assert_eq!(
            compare_scalar(&path(), None, Some("not json")).unwrap(),
            ComparisonResult::Distinct
        );
        assert_eq!(
            compare_scalar(&path(), Some("{"), None).unwrap(),
            ComparisonResult::Distinct
        );
        assert_eq!(
            compare_scalar(&path(), Some(""), Some("{}")).unwrap(),
            ComparisonResult::Distinct
        );
    }

    #[test]
    fn test_scalar_malformed_reports_side_and_path() {
        let err = compare_scalar(&path(), Some("{}"), Some("{oops")).unwrap_err();
        assert_eq!(err.side(), Side::Proposed);
        assert_eq!(err.path().as_str(), "attr");

        let err = compare_scalar(&path(), Some("[1,"), Some("{}")).unwrap_err();
        assert_eq!(err.side(), Side::Prior);
    }

    // =========================================================================
    // Lists
    // =========================================================================

    #[test]
    fn test_list_length_mismatch_is_distinct() {
        let options = CompareOptions::default();
        let result = compare_list(
            &path(),
            &strings(&["{}"]),
            &strings(&["{}", "{}"]),
            &options,
        )
        .unwrap();
        assert_eq!(result, ComparisonResult::Distinct);

        // Decided before parsing anything
        let result = compare_list(&path(), &strings(&["{"]), &[], &options).unwrap();
        assert_eq!(result, ComparisonResult::Distinct);
    }

    #[test]
    fn test_list_id_is_stripped() {
        let prior = strings(&[r#"{"id":"srv-1","name":"a"}"#, r#"{"id":"srv-2","name":"b"}"#]);
        let proposed = strings(&[r#"{"name":"a"}"#, r#"{"name":"b","id":"other"}"#]);
        let result = compare_list(&path(), &prior, &proposed, &CompareOptions::default()).unwrap();
        assert_eq!(result, ComparisonResult::Equivalent);
    }

    #[test]
    fn test_list_custom_identity_field() {
        let prior = strings(&[r#"{"uuid":"x","name":"a"}"#]);
        let proposed = strings(&[r#"{"name":"a"}"#]);
        let options = CompareOptions::new().identity_field("uuid");
        assert!(compare_list(&path(), &prior, &proposed, &options)
            .unwrap()
            .is_equivalent());
        assert!(compare_list(&path(), &prior, &proposed, &CompareOptions::default())
            .unwrap()
            .is_distinct());
    }

    #[test]
    fn test_list_reorder_is_distinct_positionally() {
        let prior = strings(&[r#"{"id":1,"v":"a"}"#, r#"{"id":2,"v":"b"}"#]);
        let proposed = strings(&[r#"{"id":2,"v":"b"}"#, r#"{"id":1,"v":"a"}"#]);
        let result = compare_list(&path(), &prior, &proposed, &CompareOptions::default()).unwrap();
        assert_eq!(result, ComparisonResult::Distinct);
    }

    #[test]
    fn test_list_reorder_is_equivalent_by_identity() {
        let prior = strings(&[r#"{"id":1,"v":"a"}"#, r#"{"id":2,"v":"b"}"#]);
        let proposed = strings(&[r#"{"id":2,"v":"b"}"#, r#"{"id":1,"v":"a"}"#]);
        let options = CompareOptions::new().list_matching(ListMatching::ByIdentity);
        let result = compare_list(&path(), &prior, &proposed, &options).unwrap();
        assert_eq!(result, ComparisonResult::Equivalent);
    }

    #[test]
    fn test_list_by_identity_detects_changed_element() {
        let prior = strings(&[r#"{"id":1,"v":"a"}"#, r#"{"id":2,"v":"b"}"#]);
        let proposed = strings(&[r#"{"id":2,"v":"b"}"#, r#"{"id":1,"v":"z"}"#]);
        let options = CompareOptions::new().list_matching(ListMatching::ByIdentity);
        assert!(compare_list(&path(), &prior, &proposed, &options)
            .unwrap()
            .is_distinct());
    }

    #[test]
    fn test_list_by_identity_without_ids_is_positional() {
        let prior = strings(&[r#"{"id":1,"v":"a"}"#]);
        let proposed = strings(&[r#"{"v":"a"}"#]);
        let options = CompareOptions::new().list_matching(ListMatching::ByIdentity);
        // One side has ids and the other doesn't: identity sets differ
        assert!(compare_list(&path(), &prior, &proposed, &options)
            .unwrap()
            .is_distinct());

        let prior = strings(&[r#"{"v":"a"}"#, r#"{"v":"b"}"#]);
        let proposed = strings(&[r#"{"v":"b"}"#, r#"{"v":"a"}"#]);
        assert!(compare_list(&path(), &prior, &proposed, &options)
            .unwrap()
            .is_distinct());
    }

    #[test]
    fn test_list_by_identity_duplicate_ids_fall_back() {
        let prior = strings(&[r#"{"id":1,"v":"a"}"#, r#"{"id":1,"v":"b"}"#]);
        let proposed = strings(&[r#"{"id":1,"v":"a"}"#, r#"{"id":1,"v":"b"}"#]);
        let options = CompareOptions::new().list_matching(ListMatching::ByIdentity);
        assert!(compare_list(&path(), &prior, &proposed, &options)
            .unwrap()
            .is_equivalent());
    }

    #[test]
    fn test_list_malformed_element_path() {
        let prior = strings(&["{}", "{}"]);
        let proposed = strings(&["{}", "nope"]);
        let err = compare_list(&path(), &prior, &proposed, &CompareOptions::default()).unwrap_err();
        assert_eq!(err.path().as_str(), "attr[1]");
        assert_eq!(err.side(), Side::Proposed);
    }

    // =========================================================================
    // Maps
    // =========================================================================

    #[test]
    fn test_map_addition_is_distinct() {
        let prior = map(&[("x", r#"{"v":1}"#)]);
        let proposed = map(&[("x", r#"{"v":1}"#), ("y", r#"{"v":2}"#)]);
        assert_eq!(
            compare_map(&path(), &prior, &proposed).unwrap(),
            ComparisonResult::Distinct
        );
    }

    #[test]
    fn test_map_removal_is_distinct() {
        let prior = map(&[("x", r#"{"v":1}"#), ("y", r#"{"v":2}"#)]);
        let proposed = map(&[("x", r#"{"v":1}"#)]);
        assert_eq!(
            compare_map(&path(), &prior, &proposed).unwrap(),
            ComparisonResult::Distinct
        );
    }

    #[test]
    fn test_map_formatting_only_is_equivalent() {
        let prior = map(&[("x", r#"{"v":1,"w":[2]}"#), ("y", "3")]);
        let proposed = map(&[("y", "3.0"), ("x", r#"{ "w": [2], "v": 1 }"#)]);
        assert_eq!(
            compare_map(&path(), &prior, &proposed).unwrap(),
            ComparisonResult::Equivalent
        );
    }

    #[test]
    fn test_map_changed_value_is_distinct() {
        let prior = map(&[("x", r#"{"v":1}"#)]);
        let proposed = map(&[("x", r#"{"v":2}"#)]);
        assert!(compare_map(&path(), &prior, &proposed).unwrap().is_distinct());
    }

    #[test]
    fn test_map_addition_short_circuits_before_parsing() {
        // "a" is scanned first and is new; the malformed "b" is never parsed
        let prior = map(&[("b", "{}")]);
        let proposed = map(&[("a", "{}"), ("b", "{broken")]);
        assert!(compare_map(&path(), &prior, &proposed).unwrap().is_distinct());
    }

    #[test]
    fn test_map_malformed_value_path() {
        let prior = map(&[("env", "{}")]);
        let proposed = map(&[("env", "{broken")]);
        let err = compare_map(&path(), &prior, &proposed).unwrap_err();
        assert_eq!(err.path().as_str(), "attr[\"env\"]");
    }

    // =========================================================================
    // Suppression
    // =========================================================================

    #[test]
    fn test_suppress_is_idempotent() {
        let options = CompareOptions::default();
        let values = [
            AttributeValue::from(r#"{"a":1}"#),
            AttributeValue::List(strings(&[r#"{"id":1}"#, "[1,2]"])),
            AttributeValue::Map(map(&[("k", "true")])),
        ];
        for value in values {
            let emitted =
                suppress_if_equivalent(&path(), value.clone(), value.clone(), &options).unwrap();
            assert_eq!(emitted, value);
        }
    }

    #[test]
    fn test_suppress_keeps_prior_when_equivalent() {
        let prior = AttributeValue::from(r#"{"a":1,"b":2}"#);
        let proposed = AttributeValue::from(r#"{"b":2.0,"a":1}"#);
        let emitted =
            suppress_if_equivalent(&path(), prior.clone(), proposed, &CompareOptions::default())
                .unwrap();
        assert_eq!(emitted, prior);
    }

    #[test]
    fn test_suppress_propagates_real_change() {
        let prior = AttributeValue::from(r#"{"a":1}"#);
        let proposed = AttributeValue::from(r#"{"a":2}"#);
        let emitted =
            suppress_if_equivalent(&path(), prior, proposed.clone(), &CompareOptions::default())
                .unwrap();
        assert_eq!(emitted, proposed);
    }

    #[test]
    fn test_suppress_kind_change() {
        let prior = AttributeValue::from("[]");
        let proposed = AttributeValue::List(vec![]);
        let emitted =
            suppress_if_equivalent(&path(), prior, proposed.clone(), &CompareOptions::default())
                .unwrap();
        assert_eq!(emitted, proposed);
    }

    #[test]
    fn test_suppress_surfaces_malformed_payload() {
        let prior = AttributeValue::from("{}");
        let proposed = AttributeValue::from("{");
        assert!(
            suppress_if_equivalent(&path(), prior, proposed, &CompareOptions::default()).is_err()
        );
    }
}
