//! Label Diff Computation
//!
//! Reconciles a desired label set against the labels observed in a repository

use std::collections::{HashMap, HashSet};

use crate::config::{Label, SyncPolicy};

/// Classification of a diff record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    Create,
    Update,
    Match,
    Extra,
}

/// Reconciliation status of one label name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelDiff {
    /// Desired label missing from the repository
    Create { desired: Label },

    /// Present on both sides with a different color and/or description
    Update {
        desired: Label,
        observed: Label,
        color_changed: bool,
        description_changed: bool,
    },

    /// Present on both sides and equal
    Match { desired: Label, observed: Label },

    /// Present in the repository only (unmanaged)
    Extra { observed: Label },
}

impl LabelDiff {
    /// Label name this record is about
    pub fn name(&self) -> &str {
        match self {
            LabelDiff::Create { desired }
            | LabelDiff::Update { desired, .. }
            | LabelDiff::Match { desired, .. } => &desired.name,
            LabelDiff::Extra { observed } => &observed.name,
        }
    }

    pub fn kind(&self) -> DiffKind {
        match self {
            LabelDiff::Create { .. } => DiffKind::Create,
            LabelDiff::Update { .. } => DiffKind::Update,
            LabelDiff::Match { .. } => DiffKind::Match,
            LabelDiff::Extra { .. } => DiffKind::Extra,
        }
    }

    pub fn desired(&self) -> Option<&Label> {
        match self {
            LabelDiff::Create { desired }
            | LabelDiff::Update { desired, .. }
            | LabelDiff::Match { desired, .. } => Some(desired),
            LabelDiff::Extra { .. } => None,
        }
    }

    pub fn observed(&self) -> Option<&Label> {
        match self {
            LabelDiff::Update { observed, .. }
            | LabelDiff::Match { observed, .. }
            | LabelDiff::Extra { observed } => Some(observed),
            LabelDiff::Create { .. } => None,
        }
    }
}

/// Compute the diff between desired and observed labels
///
/// Records for desired labels come first in desired order, followed by
/// unmanaged labels in observed order. Colors are compared after
/// normalization, descriptions as-is.
///
/// When a name occurs more than once in a list, the last occurrence supplies
/// the values and the first occurrence fixes the position.
pub fn compute_diff(desired: &[Label], observed: &[Label]) -> Vec<LabelDiff> {
    let observed_map: HashMap<&str, &Label> = observed
        .iter()
        .map(|label| (label.name.as_str(), label))
        .collect();
    let desired_map: HashMap<&str, &Label> = desired
        .iter()
        .map(|label| (label.name.as_str(), label))
        .collect();

    let mut diffs = Vec::with_capacity(desired_map.len() + observed_map.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for name in desired.iter().map(|label| label.name.as_str()) {
        if !seen.insert(name) {
            continue;
        }
        let target = desired_map[name];

        let diff = match observed_map.get(name) {
            None => LabelDiff::Create {
                desired: target.clone(),
            },
            Some(current) => {
                let color_changed = target.normalized_color() != current.normalized_color();
                let description_changed = target.description != current.description;

                if color_changed || description_changed {
                    LabelDiff::Update {
                        desired: target.clone(),
                        observed: (*current).clone(),
                        color_changed,
                        description_changed,
                    }
                } else {
                    LabelDiff::Match {
                        desired: target.clone(),
                        observed: (*current).clone(),
                    }
                }
            }
        };
        diffs.push(diff);
    }

    for name in observed.iter().map(|label| label.name.as_str()) {
        if !seen.insert(name) {
            continue;
        }
        diffs.push(LabelDiff::Extra {
            observed: observed_map[name].clone(),
        });
    }

    diffs
}

/// Per-kind record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub matches: usize,
    pub creates: usize,
    pub updates: usize,
    pub extras: usize,
}

impl DiffSummary {
    /// Number of records the policy would act on
    pub fn actionable(&self, policy: &SyncPolicy) -> usize {
        let mut total = self.creates;
        if policy.force_update {
            total += self.updates;
        }
        if policy.delete_unmanaged {
            total += self.extras;
        }
        total
    }
}

/// Count diff records by kind
pub fn summarize(diffs: &[LabelDiff]) -> DiffSummary {
    diffs
        .iter()
        .fold(DiffSummary::default(), |mut summary, diff| {
            match diff.kind() {
                DiffKind::Match => summary.matches += 1,
                DiffKind::Create => summary.creates += 1,
                DiffKind::Update => summary.updates += 1,
                DiffKind::Extra => summary.extras += 1,
            }
            summary
        })
}
