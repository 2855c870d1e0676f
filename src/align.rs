//! Structural aligner.
//!
//! Infers which generated row (and, independently, column) each ground-truth
//! row corresponds to, then derives the rows and columns the generated grid is
//! missing or has in excess. Row and column indices in a [`StructuralPlan`]
//! mean different things: `*_to_add` are ground-truth positions where an empty
//! line must be inserted, `*_to_delete` are generated positions to drop.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::classify::Classification;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralPlan {
    pub rows_to_add: BTreeSet<usize>,
    pub rows_to_delete: BTreeSet<usize>,
    pub columns_to_add: BTreeSet<usize>,
    pub columns_to_delete: BTreeSet<usize>,
}

impl StructuralPlan {
    pub fn is_empty(&self) -> bool {
        self.rows_to_add.is_empty()
            && self.rows_to_delete.is_empty()
            && self.columns_to_add.is_empty()
            && self.columns_to_delete.is_empty()
    }

    pub fn row_inserted(&mut self, index: usize) {
        self.rows_to_add.remove(&index);
        self.rows_to_add = shift_up(&self.rows_to_add, index);
    }

    pub fn column_inserted(&mut self, index: usize) {
        self.columns_to_add.remove(&index);
        self.columns_to_add = shift_up(&self.columns_to_add, index);
    }

    pub fn row_deleted(&mut self, index: usize) {
        self.rows_to_delete.remove(&index);
        self.rows_to_delete = shift_down(&self.rows_to_delete, index);
    }

    pub fn column_deleted(&mut self, index: usize) {
        self.columns_to_delete.remove(&index);
        self.columns_to_delete = shift_down(&self.columns_to_delete, index);
    }
}

fn shift_up(indices: &BTreeSet<usize>, inserted: usize) -> BTreeSet<usize> {
    indices
        .iter()
        .map(|&idx| if idx >= inserted { idx + 1 } else { idx })
        .collect()
}

fn shift_down(indices: &BTreeSet<usize>, removed: usize) -> BTreeSet<usize> {
    indices
        .iter()
        .map(|&idx| if idx > removed { idx - 1 } else { idx })
        .collect()
}

/// Maps each ground-truth index to a generated index, keeping the mapping
/// increasing. Candidates are ranked by how often they were observed, lowest
/// index first on ties; with no candidate past the last accepted index the
/// row falls back to `last + 1` without advancing `last`.
pub fn monotonic_mapping(observations: &BTreeMap<usize, Vec<usize>>) -> BTreeMap<usize, usize> {
    let mut mapping = BTreeMap::new();
    let mut last: Option<usize> = None;
    for (&truth, observed) in observations {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for &idx in observed {
            *counts.entry(idx).or_insert(0) += 1;
        }
        let mut ranked: Vec<(usize, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        match ranked
            .iter()
            .map(|&(idx, _)| idx)
            .find(|&idx| last.is_none_or(|previous| idx > previous))
        {
            Some(chosen) => {
                mapping.insert(truth, chosen);
                last = Some(chosen);
            }
            None => {
                mapping.insert(truth, last.map_or(0, |previous| previous + 1));
            }
        }
    }
    if !mapping.is_empty() && !mapping.contains_key(&0) && !mapping.values().any(|&v| v == 0) {
        mapping.insert(0, 0);
    }
    mapping
}

/// `(to_add, to_delete)` for one axis.
pub fn axis_edits(mapping: &BTreeMap<usize, usize>) -> (BTreeSet<usize>, BTreeSet<usize>) {
    let (Some(&max_key), Some(&max_target)) = (mapping.keys().max(), mapping.values().max()) else {
        return (BTreeSet::new(), BTreeSet::new());
    };

    let targets: HashSet<usize> = mapping.values().copied().collect();
    let to_delete = (0..=max_target).filter(|idx| !targets.contains(idx)).collect();

    let mut to_add: BTreeSet<usize> = (0..=max_key)
        .filter(|idx| !mapping.contains_key(idx))
        .collect();
    let mut claimed = HashSet::new();
    for (&truth, &target) in mapping {
        if !claimed.insert(target) {
            to_add.insert(truth);
        }
    }
    (to_add, to_delete)
}

pub fn plan(classification: &Classification) -> StructuralPlan {
    let mut row_observations: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut column_observations: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (truth, generated) in classification.correspondences() {
        row_observations.entry(truth.row).or_default().push(generated.row);
        column_observations
            .entry(truth.col)
            .or_default()
            .push(generated.col);
    }

    let (rows_to_add, rows_to_delete) = axis_edits(&monotonic_mapping(&row_observations));
    let (columns_to_add, columns_to_delete) = axis_edits(&monotonic_mapping(&column_observations));
    StructuralPlan {
        rows_to_add,
        rows_to_delete,
        columns_to_add,
        columns_to_delete,
    }
}
