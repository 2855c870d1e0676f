//! Greedy repair search.
//!
//! Each round generates every candidate operation from the current
//! annotations, simulates it on a copy of the state, and commits the best one.
//! The first commit may tie the initial score; every later commit must
//! strictly improve on the previous one, which bounds the loop even without
//! `max_iterations`. After a commit the classification and the structural
//! plan are rebuilt from the real state.

use log::{debug, info};
use serde::Serialize;

use crate::{
    align::{self, StructuralPlan},
    classify::{self, Classification, ClassificationSummary},
    config::RepairConfig,
    edits::{self, EditInstruction},
    grid::Grid,
    operations::{self, Operation},
    score::{self, ScoreBreakdown},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RepairState {
    pub generated: Grid,
    pub plan: StructuralPlan,
}

impl RepairState {
    pub fn apply(&mut self, operation: &Operation) {
        operation.apply(&mut self.generated, &mut self.plan);
    }

    /// Score of the state after `operation`, leaving `self` untouched.
    pub fn simulate(&self, operation: &Operation, groundtruth: &Grid) -> ScoreBreakdown {
        let mut trial = self.clone();
        trial.apply(operation);
        score::score(&trial.generated, groundtruth)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedOperation {
    pub step: usize,
    #[serde(flatten)]
    pub operation: Operation,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub initial_score: ScoreBreakdown,
    pub final_score: ScoreBreakdown,
    pub operations: Vec<LoggedOperation>,
    pub summary: ClassificationSummary,
    /// Final generated grid, annotated with the last classification.
    #[serde(skip)]
    pub repaired: Grid,
}

impl RepairOutcome {
    pub fn repaired_rows(&self) -> Vec<Vec<String>> {
        self.repaired.to_rows()
    }

    /// Compact `name(params)` list, one entry per committed operation.
    pub fn operation_log(&self) -> Vec<String> {
        self.operations
            .iter()
            .map(|logged| logged.operation.to_string())
            .collect()
    }
}

/// Pads both tables to a common shape. Cells keep their text as loaded;
/// comparisons go through [`DataPoint::key`](crate::cell::DataPoint::key).
pub fn prepare_grids(
    generated_rows: &[Vec<String>],
    groundtruth_rows: &[Vec<String>],
) -> (Grid, Grid) {
    let mut generated = Grid::from_rows(generated_rows);
    let mut groundtruth = Grid::from_rows(groundtruth_rows);
    let rows = generated.rows().max(groundtruth.rows());
    let cols = generated.cols().max(groundtruth.cols());
    generated.pad_to(rows, cols);
    groundtruth.pad_to(rows, cols);
    (generated, groundtruth)
}

/// Classifies the current state, annotates both grids and returns the
/// classification with its structural plan.
pub fn analyze(
    generated: &mut Grid,
    groundtruth: &mut Grid,
    config: &RepairConfig,
) -> (Classification, StructuralPlan) {
    let classification = classify::classify(generated, groundtruth, config);
    classify::annotate(&classification, generated, groundtruth);
    let plan = align::plan(&classification);
    debug!("Structural plan: {plan:?}");
    (classification, plan)
}

/// Applies `edits` to the generated table, then runs the greedy search.
pub fn repair(
    generated_rows: &[Vec<String>],
    groundtruth_rows: &[Vec<String>],
    edits: &[EditInstruction],
    config: &RepairConfig,
) -> RepairOutcome {
    let mut edited = Grid::from_rows(generated_rows);
    if !edits.is_empty() {
        let applied = edits::apply_all(&mut edited, edits);
        info!("Applied {applied} of {} edit instruction(s)", edits.len());
    }
    let (generated, groundtruth) = prepare_grids(&edited.to_rows(), groundtruth_rows);
    search(generated, groundtruth, config)
}

/// Runs the greedy loop on already prepared grids.
pub fn search(generated: Grid, mut groundtruth: Grid, config: &RepairConfig) -> RepairOutcome {
    let mut state = RepairState {
        generated,
        plan: StructuralPlan::default(),
    };
    let (mut classification, plan) = analyze(&mut state.generated, &mut groundtruth, config);
    state.plan = plan;

    let initial_score = score::score(&state.generated, &groundtruth);
    info!(
        "Initial score {:.4} ({} exact, {} misplaced of {} cells)",
        initial_score.score,
        initial_score.exact_matches,
        initial_score.misplaced_matches,
        initial_score.groundtruth_cells
    );

    let mut current = initial_score;
    let mut committed: Vec<LoggedOperation> = Vec::new();
    while !current.is_perfect() && committed.len() < config.max_iterations {
        let candidates =
            operations::generate(&classification, &state.generated, &groundtruth, &state.plan);
        if candidates.is_empty() {
            info!("No candidate operations left");
            break;
        }

        let mut best: Option<(usize, ScoreBreakdown)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let trial = state.simulate(candidate, &groundtruth);
            debug!("Candidate {candidate} scores {:.4}", trial.score);
            if best.is_none_or(|(_, top)| trial.score > top.score) {
                best = Some((idx, trial));
            }
        }
        let Some((best_idx, best_score)) = best else {
            break;
        };

        let accepted = if committed.is_empty() {
            best_score.score >= current.score
        } else {
            best_score.score > current.score
        };
        if !accepted {
            info!(
                "Stopping: best candidate scores {:.4}, current {:.4}",
                best_score.score, current.score
            );
            break;
        }

        let operation = candidates[best_idx].clone();
        state.apply(&operation);
        current = score::score(&state.generated, &groundtruth);
        info!(
            "Step {}: {operation} -> {:.4}",
            committed.len() + 1,
            current.score
        );
        committed.push(LoggedOperation {
            step: committed.len() + 1,
            operation,
            score: current.score,
        });

        let (next, plan) = analyze(&mut state.generated, &mut groundtruth, config);
        classification = next;
        state.plan = plan;
    }

    RepairOutcome {
        initial_score,
        final_score: current,
        operations: committed,
        summary: classification.summary(),
        repaired: state.generated,
    }
}
