//! Alignment score.
//!
//! `score = (2 * exact + misplaced) / (2 * groundtruth_cells)`: a generated
//! cell whose coordinates and value agree with the ground truth is worth two
//! points, a value found elsewhere in the grid is worth one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{cell::Coord, grid::Grid, matcher};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub exact_matches: usize,
    pub misplaced_matches: usize,
    pub groundtruth_cells: usize,
    pub score: f64,
}

impl ScoreBreakdown {
    pub fn is_perfect(&self) -> bool {
        self.score >= 1.0
    }
}

/// Generated cells whose `(coordinates, key)` also occurs in the ground truth.
pub fn exact_matches(generated: &Grid, groundtruth: &Grid) -> usize {
    let truth: HashSet<(Coord, String)> = groundtruth
        .cells()
        .iter()
        .map(|point| (point.coords, point.key()))
        .collect();
    generated
        .cells()
        .iter()
        .filter(|point| truth.contains(&(point.coords, point.key())))
        .count()
}

pub fn score(generated: &Grid, groundtruth: &Grid) -> ScoreBreakdown {
    let exact = exact_matches(generated, groundtruth);
    let misplaced = matcher::match_values(generated, groundtruth)
        .iter()
        .filter(|pair| pair.is_misplaced())
        .count();
    let cells = groundtruth.cell_count();
    let score = if cells == 0 {
        1.0
    } else {
        (2 * exact + misplaced) as f64 / (2 * cells) as f64
    };
    ScoreBreakdown {
        exact_matches: exact,
        misplaced_matches: misplaced,
        groundtruth_cells: cells,
        score,
    }
}
