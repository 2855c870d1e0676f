//! Value matcher.
//!
//! Non-empty cells are grouped per grid by comparison key. A key present in
//! both grids forms one correspondence whose shape depends on how many cells
//! carry it on each side; every shape is resolved into concrete point pairs by
//! repeatedly taking the nearest remaining cell of the other side.
//!
//! Ordering is deterministic: groups are visited by the row-major position of
//! their first cell, members are kept in row-major order, and distance ties go
//! to the first candidate in that order.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{cell::Coord, grid::Grid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPair {
    pub generated: Coord,
    pub groundtruth: Coord,
}

impl MatchPair {
    pub fn new(generated: Coord, groundtruth: Coord) -> Self {
        Self {
            generated,
            groundtruth,
        }
    }

    pub fn is_misplaced(&self) -> bool {
        self.generated != self.groundtruth
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correspondence {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Correspondence {
    fn classify(generated: usize, groundtruth: usize) -> Self {
        match (generated > 1, groundtruth > 1) {
            (false, false) => Correspondence::OneToOne,
            (false, true) => Correspondence::OneToMany,
            (true, false) => Correspondence::ManyToOne,
            (true, true) => Correspondence::ManyToMany,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Correspondence::OneToOne => 0,
            Correspondence::OneToMany => 1,
            Correspondence::ManyToOne => 2,
            Correspondence::ManyToMany => 3,
        }
    }
}

#[derive(Debug, Clone)]
struct ValueGroup {
    generated: Vec<Coord>,
    groundtruth: Vec<Coord>,
}

impl ValueGroup {
    fn shape(&self) -> Correspondence {
        Correspondence::classify(self.generated.len(), self.groundtruth.len())
    }

    /// Walks the smaller side, pairing each member with its nearest partner.
    fn resolve(mut self, pairs: &mut Vec<MatchPair>) {
        if self.generated.len() < self.groundtruth.len() {
            for generated in self.generated {
                if let Some(groundtruth) = take_nearest(&mut self.groundtruth, generated) {
                    pairs.push(MatchPair::new(generated, groundtruth));
                }
            }
        } else {
            for groundtruth in self.groundtruth {
                if let Some(generated) = take_nearest(&mut self.generated, groundtruth) {
                    pairs.push(MatchPair::new(generated, groundtruth));
                }
            }
        }
    }
}

/// Removes and returns the pool member closest to `from`; the first one wins ties.
pub fn take_nearest(pool: &mut Vec<Coord>, from: Coord) -> Option<Coord> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in pool.iter().enumerate() {
        let distance = from.distance(*candidate);
        if best.is_none_or(|(_, current)| distance < current) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| pool.remove(idx))
}

fn group_by_key(grid: &Grid) -> (Vec<String>, HashMap<String, Vec<Coord>>) {
    let mut order = Vec::new();
    let mut groups: HashMap<String, Vec<Coord>> = HashMap::new();
    for point in grid.cells() {
        let key = point.key();
        if key.is_empty() {
            continue;
        }
        groups
            .entry(key)
            .or_insert_with_key(|key| {
                order.push(key.clone());
                Vec::new()
            })
            .push(point.coords);
    }
    (order, groups)
}

/// Pairs generated and ground-truth cells that hold the same value.
pub fn match_values(generated: &Grid, groundtruth: &Grid) -> Vec<MatchPair> {
    let (order, mut generated_groups) = group_by_key(generated);
    let (_, mut groundtruth_groups) = group_by_key(groundtruth);

    let mut groups = Vec::new();
    for key in order {
        let Some(groundtruth) = groundtruth_groups.remove(&key) else {
            continue;
        };
        let generated = generated_groups.remove(&key).unwrap_or_default();
        groups.push(ValueGroup {
            generated,
            groundtruth,
        });
    }
    // Stable: keeps first-occurrence order inside each shape.
    groups.sort_by_key(|group| group.shape().rank());

    let mut counts = [0usize; 4];
    let mut pairs = Vec::new();
    for group in groups {
        counts[group.shape().rank() as usize] += 1;
        group.resolve(&mut pairs);
    }
    debug!(
        "Value groups: {} one-to-one, {} one-to-many, {} many-to-one, {} many-to-many -> {} pair(s)",
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        pairs.len()
    );
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_prefers_first_on_ties() {
        let mut pool = vec![Coord::new(0, 0), Coord::new(0, 2)];
        assert_eq!(take_nearest(&mut pool, Coord::new(0, 1)), Some(Coord::new(0, 0)));
        assert_eq!(pool, vec![Coord::new(0, 2)]);
    }

    fn pair(generated: (usize, usize), groundtruth: (usize, usize)) -> MatchPair {
        MatchPair::new(
            Coord::new(generated.0, generated.1),
            Coord::new(groundtruth.0, groundtruth.1),
        )
    }

    #[test]
    fn single_generated_cell_takes_the_nearest_of_many() {
        let generated = Grid::from_rows(&[vec!["7", "", ""], vec!["", "", ""], vec!["", "", ""]]);
        let groundtruth =
            Grid::from_rows(&[vec!["", "7", ""], vec!["7", "", ""], vec!["", "", "7"]]);
        assert_eq!(match_values(&generated, &groundtruth), vec![pair((0, 0), (0, 1))]);
    }

    #[test]
    fn single_groundtruth_cell_takes_the_nearest_of_many() {
        let generated = Grid::from_rows(&[vec!["", "", "5"], vec!["", "", ""], vec!["5", "", ""]]);
        let groundtruth =
            Grid::from_rows(&[vec!["", "", ""], vec!["", "", ""], vec!["", "5", ""]]);
        assert_eq!(match_values(&generated, &groundtruth), vec![pair((2, 0), (2, 1))]);
    }

    #[test]
    fn many_to_many_removes_each_chosen_partner() {
        let generated = Grid::from_rows(&[vec!["9", "9", ""], vec!["", "", ""], vec!["", "", ""]]);
        let groundtruth =
            Grid::from_rows(&[vec!["", "9", ""], vec!["", "9", ""], vec!["", "", "9"]]);
        assert_eq!(
            match_values(&generated, &groundtruth),
            vec![pair((0, 0), (0, 1)), pair((0, 1), (1, 1))]
        );
    }

    #[test]
    fn equal_sized_groups_walk_the_groundtruth_side() {
        let generated = Grid::from_rows(&[vec!["4"], vec!["4"], vec![""]]);
        let groundtruth = Grid::from_rows(&[vec![""], vec!["4"], vec!["4"]]);
        assert_eq!(
            match_values(&generated, &groundtruth),
            vec![pair((1, 0), (1, 0)), pair((0, 0), (2, 0))]
        );
    }

    #[test]
    fn one_to_one_groups_resolve_before_larger_shapes() {
        let generated = Grid::from_rows(&[vec!["a", "a", "b"]]);
        let groundtruth = Grid::from_rows(&[vec!["a", "b", ""]]);
        assert_eq!(
            match_values(&generated, &groundtruth),
            vec![pair((0, 2), (0, 1)), pair((0, 0), (0, 0))]
        );
    }

    #[test]
    fn empty_cells_are_never_matched() {
        let generated = Grid::from_rows(&[vec!["", " "]]);
        let groundtruth = Grid::from_rows(&[vec!["", ""]]);
        assert!(match_values(&generated, &groundtruth).is_empty());
    }

    #[test]
    fn shapes_follow_group_sizes() {
        assert_eq!(Correspondence::classify(1, 1), Correspondence::OneToOne);
        assert_eq!(Correspondence::classify(1, 3), Correspondence::OneToMany);
        assert_eq!(Correspondence::classify(2, 1), Correspondence::ManyToOne);
        assert_eq!(Correspondence::classify(2, 2), Correspondence::ManyToMany);
    }
}
