//! Record-level planning - run suppression over every attribute of a record

use crate::compare::compare;
use crate::error::Result;
use crate::types::{AttributePath, AttributeValue, CompareOptions};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A record's attributes, keyed by attribute name
pub type Record = BTreeMap<String, AttributeValue>;

/// Kind of change detected for one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Present only in the proposed record
    Added,
    /// Present only in the prior record
    Removed,
    /// Present in both with a real difference
    Modified,
}

/// A real change to one attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDiff {
    /// Attribute the change applies to
    pub path: AttributePath,
    /// What kind of change this is
    pub change: ChangeKind,
    /// Last-known value, if any
    pub prior: Option<AttributeValue>,
    /// Proposed value, if any
    pub proposed: Option<AttributeValue>,
}

impl AttributeDiff {
    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        self.change == ChangeKind::Added
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        self.change == ChangeKind::Removed
    }

    /// Check if this diff represents a modification
    pub fn is_modification(&self) -> bool {
        self.change == ChangeKind::Modified
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of attributes added
    pub additions: usize,
    /// Number of attributes removed
    pub removals: usize,
    /// Number of attributes really modified
    pub modifications: usize,
    /// Number of textual differences suppressed as formatting-only
    pub suppressed: usize,
}

impl DiffSummary {
    /// Total number of real changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any real changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }

    fn add_diff(&mut self, diff: &AttributeDiff) {
        match diff.change {
            ChangeKind::Added => self.additions += 1,
            ChangeKind::Removed => self.removals += 1,
            ChangeKind::Modified => self.modifications += 1,
        }
    }
}

/// Outcome of planning a whole record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPlan {
    /// The record to emit: prior values kept wherever the change was cosmetic
    pub planned: Record,
    /// Real changes, ordered by attribute name
    pub diffs: Vec<AttributeDiff>,
    /// Counts of changes and suppressions
    pub summary: DiffSummary,
}

impl RecordPlan {
    /// Check if the plan carries any real change
    pub fn has_changes(&self) -> bool {
        self.summary.has_changes()
    }
}

/// Per-attribute result, before being folded into the plan
enum Outcome {
    Unchanged(AttributeValue),
    Suppressed(AttributeValue),
    Changed(AttributeDiff),
}

/// Plan a record by suppressing formatting-only differences attribute by attribute
///
/// Attributes are independent and are evaluated in parallel. If any attribute
/// holds a malformed payload the plan fails; with several failures the one
/// for the first attribute name is reported.
pub fn plan_record(prior: &Record, proposed: &Record, options: &CompareOptions) -> Result<RecordPlan> {
    let names: Vec<&String> = prior
        .keys()
        .chain(proposed.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let outcomes: Vec<Result<Outcome>> = names
        .par_iter()
        .map(|name| evaluate(name, prior.get(*name), proposed.get(*name), options))
        .collect();

    let mut plan = RecordPlan {
        planned: Record::new(),
        diffs: Vec::new(),
        summary: DiffSummary::default(),
    };

    for (name, outcome) in names.into_iter().zip(outcomes) {
        match outcome? {
            Outcome::Unchanged(value) => {
                plan.planned.insert(name.clone(), value);
            }
            Outcome::Suppressed(value) => {
                plan.summary.suppressed += 1;
                plan.planned.insert(name.clone(), value);
            }
            Outcome::Changed(diff) => {
                plan.summary.add_diff(&diff);
                if let Some(value) = &diff.proposed {
                    plan.planned.insert(name.clone(), value.clone());
                }
                plan.diffs.push(diff);
            }
        }
    }

    log::debug!(
        "planned {} attribute(s): {} change(s), {} suppressed",
        plan.planned.len(),
        plan.summary.total(),
        plan.summary.suppressed
    );

    Ok(plan)
}

fn evaluate(
    name: &str,
    prior: Option<&AttributeValue>,
    proposed: Option<&AttributeValue>,
    options: &CompareOptions,
) -> Result<Outcome> {
    let path = AttributePath::new(name);
    let change = match (prior, proposed) {
        (Some(prior), Some(proposed)) => {
            if compare(&path, prior, proposed, options)?.is_equivalent() {
                if prior == proposed {
                    return Ok(Outcome::Unchanged(prior.clone()));
                }
                log::debug!("{}: suppressing formatting-only diff", path);
                return Ok(Outcome::Suppressed(prior.clone()));
            }
            ChangeKind::Modified
        }
        (None, Some(_)) => ChangeKind::Added,
        (Some(_), None) => ChangeKind::Removed,
        (None, None) => unreachable!("attribute names come from one of the two records"),
    };

    Ok(Outcome::Changed(AttributeDiff {
        path,
        change,
        prior: prior.cloned(),
        proposed: proposed.cloned(),
    }))
}
