//! Reconstruction detector.
//!
//! Looks for leftover cells whose value is the concatenation of several
//! same-row leftover cells on the other side. A ground-truth value rebuilt from
//! generated fragments is a split mistake (the extractor cut one cell into
//! several); a generated value rebuilt from ground-truth fragments is a merge
//! mistake (the extractor glued several cells together).
//!
//! Search order, for one source cell:
//! 1. if every candidate fragment sits on one row, all permutations of the
//!    full candidate set;
//! 2. otherwise subset size ascending, then row ascending, then combinations
//!    and permutations in `itertools` order.
//!
//! The first permutation whose concatenated keys equal the source key wins.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::cell::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Generated,
    Groundtruth,
}

/// An unmatched, non-empty cell and its comparison key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leftover {
    pub coords: Coord,
    pub key: String,
}

impl Leftover {
    pub fn new(coords: Coord, key: impl Into<String>) -> Self {
        Self {
            coords,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconstruction {
    /// Side that holds the single, whole value.
    pub single_side: Side,
    pub single: Coord,
    /// Fragments on the other side, in concatenation order.
    pub fragments: Vec<Coord>,
}

/// Runs the ground-truth pass then the generated pass, consuming every cell it
/// explains from both leftover pools.
pub fn find_reconstructions(
    groundtruth: &mut Vec<Leftover>,
    generated: &mut Vec<Leftover>,
    max_candidates: usize,
) -> Vec<Reconstruction> {
    let mut found = Vec::new();
    reconstruct_pass(
        Side::Groundtruth,
        groundtruth,
        generated,
        max_candidates,
        &mut found,
    );
    reconstruct_pass(
        Side::Generated,
        generated,
        groundtruth,
        max_candidates,
        &mut found,
    );
    found
}

fn reconstruct_pass(
    side: Side,
    sources: &mut Vec<Leftover>,
    targets: &mut Vec<Leftover>,
    max_candidates: usize,
    found: &mut Vec<Reconstruction>,
) {
    let mut unexplained = Vec::with_capacity(sources.len());
    for source in sources.drain(..) {
        let Some(used) = reconstruct(&source, targets, max_candidates) else {
            unexplained.push(source);
            continue;
        };
        let fragments = used.iter().map(|&idx| targets[idx].coords).collect();
        let mut removal = used;
        removal.sort_unstable_by(|a, b| b.cmp(a));
        for idx in removal {
            targets.remove(idx);
        }
        found.push(Reconstruction {
            single_side: side,
            single: source.coords,
            fragments,
        });
    }
    *sources = unexplained;
}

/// Indices into `targets`, in concatenation order, that rebuild `source`.
pub fn reconstruct(
    source: &Leftover,
    targets: &[Leftover],
    max_candidates: usize,
) -> Option<Vec<usize>> {
    if source.key.is_empty() {
        return None;
    }
    let by_row = candidates_by_row(source, targets, max_candidates);
    if by_row.is_empty() {
        return None;
    }

    if by_row.len() == 1 {
        let group = by_row.values().next()?;
        if let Some(found) = first_permutation(source, targets, group) {
            return Some(found);
        }
    }

    let widest = by_row.values().map(Vec::len).max().unwrap_or(0);
    for size in 1..=widest {
        for group in by_row.values().filter(|group| group.len() >= size) {
            for subset in group.iter().copied().combinations(size) {
                if let Some(found) = first_permutation(source, targets, &subset) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// One candidate per distinct key whose value occurs inside the source.
fn candidates_by_row(
    source: &Leftover,
    targets: &[Leftover],
    max_candidates: usize,
) -> BTreeMap<usize, Vec<usize>> {
    let mut seen_keys: Vec<&str> = Vec::new();
    let mut by_row: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, target) in targets.iter().enumerate() {
        if target.key.is_empty()
            || !source.key.contains(target.key.as_str())
            || seen_keys.contains(&target.key.as_str())
        {
            continue;
        }
        seen_keys.push(&target.key);
        let row = by_row.entry(target.coords.row).or_default();
        if row.len() < max_candidates {
            row.push(idx);
        }
    }
    by_row
}

fn first_permutation(source: &Leftover, targets: &[Leftover], subset: &[usize]) -> Option<Vec<usize>> {
    let total: usize = subset.iter().map(|&idx| targets[idx].key.len()).sum();
    if total != source.key.len() {
        return None;
    }
    subset
        .iter()
        .copied()
        .permutations(subset.len())
        .find(|perm| concatenates_to(&source.key, perm.iter().map(|&idx| targets[idx].key.as_str())))
}

fn concatenates_to<'a>(whole: &str, parts: impl Iterator<Item = &'a str>) -> bool {
    let mut rest = whole;
    for part in parts {
        match rest.strip_prefix(part) {
            Some(remaining) => rest = remaining,
            None => return false,
        }
    }
    rest.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leftover(row: usize, col: usize, key: &str) -> Leftover {
        Leftover::new(Coord::new(row, col), key)
    }

    #[test]
    fn concatenation_must_consume_the_whole_value() {
        assert!(concatenates_to("100", ["10", "0"].into_iter()));
        assert!(!concatenates_to("100", ["0", "10"].into_iter()));
        assert!(!concatenates_to("1000", ["10", "0"].into_iter()));
    }

    #[test]
    fn fragments_on_different_rows_do_not_reconstruct() {
        let source = leftover(0, 0, "100");
        let targets = vec![leftover(0, 0, "10"), leftover(1, 1, "0")];
        assert_eq!(reconstruct(&source, &targets, 8), None);
    }

    #[test]
    fn permutation_order_is_recorded() {
        let source = leftover(0, 0, "NetIncome");
        let targets = vec![leftover(2, 3, "Income"), leftover(2, 1, "Net")];
        assert_eq!(reconstruct(&source, &targets, 8), Some(vec![1, 0]));
    }

    #[test]
    fn smaller_subset_is_found_when_the_full_set_fails() {
        let source = leftover(0, 0, "1234");
        let targets = vec![
            leftover(0, 0, "12"),
            leftover(0, 1, "34"),
            leftover(0, 2, "3"),
        ];
        assert_eq!(reconstruct(&source, &targets, 8), Some(vec![0, 1]));
    }
}
