//! Classification pipeline.
//!
//! Runs the value matcher, the reconstruction detector and the residual
//! classifier in that order, each consuming what the previous stage left
//! unexplained, then writes the result onto both grids as cell annotations.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    cell::{Coord, Placement, ReferencePlace, ValueType},
    config::RepairConfig,
    grid::Grid,
    matcher::{self, MatchPair},
    reconstruct::{self, Leftover, Side},
    residual,
};

/// One generated cell holding what the ground truth spreads over several cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMistake {
    pub generated: Coord,
    pub groundtruth: Vec<Coord>,
}

/// Several generated cells holding what the ground truth keeps in one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMistake {
    pub generated: Vec<Coord>,
    pub groundtruth: Coord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub matches: Vec<MatchPair>,
    pub merge_mistakes: Vec<MergeMistake>,
    pub split_mistakes: Vec<SplitMistake>,
    pub minor_mistakes: Vec<MatchPair>,
    pub generated_only: Vec<Coord>,
    pub missing: Vec<Coord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub matched: usize,
    pub misplaced: usize,
    pub merge_mistakes: usize,
    pub split_mistakes: usize,
    pub minor_mistakes: usize,
    pub generated_only: usize,
    pub missing: usize,
}

impl Classification {
    /// `(groundtruth, generated)` coordinate pairs behind every resolved mistake or match.
    pub fn correspondences(&self) -> Vec<(Coord, Coord)> {
        let mut pairs = Vec::new();
        for pair in &self.minor_mistakes {
            pairs.push((pair.groundtruth, pair.generated));
        }
        for mistake in &self.merge_mistakes {
            for &fragment in &mistake.groundtruth {
                pairs.push((fragment, mistake.generated));
            }
        }
        for mistake in &self.split_mistakes {
            if let Some(&first) = mistake.generated.first() {
                pairs.push((mistake.groundtruth, first));
            }
        }
        for pair in &self.matches {
            pairs.push((pair.groundtruth, pair.generated));
        }
        pairs
    }

    pub fn summary(&self) -> ClassificationSummary {
        ClassificationSummary {
            matched: self.matches.len(),
            misplaced: self.matches.iter().filter(|pair| pair.is_misplaced()).count(),
            merge_mistakes: self.merge_mistakes.len(),
            split_mistakes: self.split_mistakes.len(),
            minor_mistakes: self.minor_mistakes.len(),
            generated_only: self.generated_only.len(),
            missing: self.missing.len(),
        }
    }
}

fn leftovers(grid: &Grid, claimed: &HashSet<Coord>) -> Vec<Leftover> {
    grid.cells()
        .iter()
        .filter(|point| !claimed.contains(&point.coords))
        .filter_map(|point| {
            let key = point.key();
            (!key.is_empty()).then(|| Leftover::new(point.coords, key))
        })
        .collect()
}

pub fn classify(generated: &Grid, groundtruth: &Grid, config: &RepairConfig) -> Classification {
    let matches = matcher::match_values(generated, groundtruth);

    let claimed_generated: HashSet<Coord> = matches.iter().map(|pair| pair.generated).collect();
    let claimed_groundtruth: HashSet<Coord> =
        matches.iter().map(|pair| pair.groundtruth).collect();
    let mut generated_left = leftovers(generated, &claimed_generated);
    let mut groundtruth_left = leftovers(groundtruth, &claimed_groundtruth);

    let reconstructions = reconstruct::find_reconstructions(
        &mut groundtruth_left,
        &mut generated_left,
        config.max_reconstruction_candidates,
    );
    let mut merge_mistakes = Vec::new();
    let mut split_mistakes = Vec::new();
    for found in reconstructions {
        match found.single_side {
            Side::Groundtruth => split_mistakes.push(SplitMistake {
                generated: found.fragments,
                groundtruth: found.single,
            }),
            Side::Generated => merge_mistakes.push(MergeMistake {
                generated: found.single,
                groundtruth: found.fragments,
            }),
        }
    }

    let minor_mistakes = residual::pair_minor_mistakes(
        &mut groundtruth_left,
        &mut generated_left,
        config.similarity_threshold,
    );

    let classification = Classification {
        matches,
        merge_mistakes,
        split_mistakes,
        minor_mistakes,
        generated_only: generated_left.into_iter().map(|left| left.coords).collect(),
        missing: groundtruth_left.into_iter().map(|left| left.coords).collect(),
    };
    debug!("Classification: {:?}", classification.summary());
    classification
}

/// Resets both grids' annotations and writes `classification` onto them.
pub fn annotate(classification: &Classification, generated: &mut Grid, groundtruth: &mut Grid) {
    generated.reset_annotations();
    groundtruth.reset_annotations();

    for pair in &classification.matches {
        if let Some(point) = generated.get_mut(pair.generated) {
            point.value_type = ValueType::Matching;
            point.reference_place = ReferencePlace::Single(pair.groundtruth);
            point.place_type = if pair.is_misplaced() {
                Placement::Misplaced
            } else {
                Placement::InPlace
            };
        }
        if let Some(point) = groundtruth.get_mut(pair.groundtruth) {
            point.value_type = ValueType::Matching;
            point.reference_place = ReferencePlace::Single(pair.generated);
        }
    }

    for mistake in &classification.split_mistakes {
        for &fragment in &mistake.generated {
            if let Some(point) = generated.get_mut(fragment) {
                point.value_type = ValueType::SplitProblem;
                point.reference_place = ReferencePlace::Single(mistake.groundtruth);
                point.place_type = Placement::SplitFrom(mistake.generated.clone());
            }
        }
        if let Some(point) = groundtruth.get_mut(mistake.groundtruth) {
            point.value_type = ValueType::SplitProblem;
            point.reference_place = ReferencePlace::Group(mistake.generated.clone());
        }
    }

    for mistake in &classification.merge_mistakes {
        if let Some(point) = generated.get_mut(mistake.generated) {
            point.value_type = ValueType::MergeProblem;
            point.reference_place = ReferencePlace::Group(mistake.groundtruth.clone());
        }
        for &fragment in &mistake.groundtruth {
            if let Some(point) = groundtruth.get_mut(fragment) {
                point.value_type = ValueType::MergeProblem;
                point.reference_place = ReferencePlace::Single(mistake.generated);
            }
        }
    }

    for pair in &classification.minor_mistakes {
        let expected = groundtruth.value(pair.groundtruth).map(str::to_string);
        if let Some(point) = generated.get_mut(pair.generated) {
            point.value_type = ValueType::MinorNumericMistake;
            point.reference_place = ReferencePlace::Single(pair.groundtruth);
            point.expected_value = expected;
        }
        if let Some(point) = groundtruth.get_mut(pair.groundtruth) {
            point.value_type = ValueType::MinorNumericMistake;
            point.reference_place = ReferencePlace::Single(pair.generated);
        }
    }

    for &coords in &classification.generated_only {
        if let Some(point) = generated.get_mut(coords) {
            point.value_type = ValueType::GeneratedOnly;
        }
    }
    for &coords in &classification.missing {
        if let Some(point) = groundtruth.get_mut(coords) {
            point.value_type = ValueType::Missing;
        }
    }
}
