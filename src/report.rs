//! Human and machine readable reports for `compare` and `repair`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::{
    align::StructuralPlan,
    cell::Coord,
    classify::{Classification, ClassificationSummary},
    grid::Grid,
    score::ScoreBreakdown,
    search::{LoggedOperation, RepairOutcome},
    table,
};

#[derive(Debug, Clone, Serialize)]
pub struct MinorMistakeEntry {
    pub generated: Coord,
    pub groundtruth: Coord,
    pub found: String,
    pub expected: String,
    pub diff: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub generated_file: String,
    pub groundtruth_file: String,
    pub score: ScoreBreakdown,
    pub summary: ClassificationSummary,
    pub plan: StructuralPlan,
    pub classification: Classification,
    pub minor_mistakes: Vec<MinorMistakeEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairReport<'a> {
    pub generated_file: String,
    pub groundtruth_file: String,
    pub initial_score: ScoreBreakdown,
    pub final_score: ScoreBreakdown,
    pub summary: ClassificationSummary,
    pub operations: &'a [LoggedOperation],
    pub repaired: Vec<Vec<String>>,
}

/// Character diff of `found` against `expected`: `[-x-]` removed, `{+y+}` added.
pub fn char_diff(found: &str, expected: &str) -> String {
    let diff = TextDiff::from_chars(found, expected);
    let mut rendered = String::new();
    let mut open: Option<ChangeTag> = None;
    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if open != Some(tag) {
            close_marker(&mut rendered, open);
            match tag {
                ChangeTag::Delete => rendered.push_str("[-"),
                ChangeTag::Insert => rendered.push_str("{+"),
                ChangeTag::Equal => {}
            }
            open = Some(tag);
        }
        rendered.push_str(change.value());
    }
    close_marker(&mut rendered, open);
    rendered
}

fn close_marker(rendered: &mut String, open: Option<ChangeTag>) {
    match open {
        Some(ChangeTag::Delete) => rendered.push_str("-]"),
        Some(ChangeTag::Insert) => rendered.push_str("+}"),
        _ => {}
    }
}

pub fn minor_mistake_entries(
    classification: &Classification,
    generated: &Grid,
    groundtruth: &Grid,
) -> Vec<MinorMistakeEntry> {
    classification
        .minor_mistakes
        .iter()
        .map(|pair| {
            let found = generated.value(pair.generated).unwrap_or_default().to_string();
            let expected = groundtruth.value(pair.groundtruth).unwrap_or_default().to_string();
            MinorMistakeEntry {
                generated: pair.generated,
                groundtruth: pair.groundtruth,
                diff: char_diff(&found, &expected),
                found,
                expected,
            }
        })
        .collect()
}

fn join_coords(coords: &[Coord]) -> String {
    coords
        .iter()
        .map(Coord::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per finding: kind, generated side, ground-truth side, detail.
pub fn classification_rows(
    classification: &Classification,
    generated: &Grid,
    groundtruth: &Grid,
) -> Vec<Vec<String>> {
    let value_at = |grid: &Grid, coords: Coord| grid.value(coords).unwrap_or_default().to_string();
    let mut rows = Vec::new();
    for pair in classification.matches.iter().filter(|pair| pair.is_misplaced()) {
        rows.push(vec![
            "misplaced".to_string(),
            pair.generated.to_string(),
            pair.groundtruth.to_string(),
            value_at(generated, pair.generated),
        ]);
    }
    for mistake in &classification.merge_mistakes {
        rows.push(vec![
            "merge".to_string(),
            mistake.generated.to_string(),
            join_coords(&mistake.groundtruth),
            value_at(generated, mistake.generated),
        ]);
    }
    for mistake in &classification.split_mistakes {
        rows.push(vec![
            "split".to_string(),
            join_coords(&mistake.generated),
            mistake.groundtruth.to_string(),
            value_at(groundtruth, mistake.groundtruth),
        ]);
    }
    for entry in minor_mistake_entries(classification, generated, groundtruth) {
        rows.push(vec![
            "minor".to_string(),
            entry.generated.to_string(),
            entry.groundtruth.to_string(),
            entry.diff,
        ]);
    }
    for &coords in &classification.generated_only {
        rows.push(vec![
            "generated-only".to_string(),
            coords.to_string(),
            String::new(),
            value_at(generated, coords),
        ]);
    }
    for &coords in &classification.missing {
        rows.push(vec![
            "missing".to_string(),
            String::new(),
            coords.to_string(),
            value_at(groundtruth, coords),
        ]);
    }
    rows
}

fn score_line(label: &str, score: &ScoreBreakdown) -> String {
    format!(
        "{label}: {:.4} ({} exact, {} misplaced, {} cells)",
        score.score, score.exact_matches, score.misplaced_matches, score.groundtruth_cells
    )
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

pub fn compare_report(
    generated_path: &Path,
    groundtruth_path: &Path,
    score: ScoreBreakdown,
    plan: StructuralPlan,
    classification: Classification,
    generated: &Grid,
    groundtruth: &Grid,
) -> CompareReport {
    CompareReport {
        generated_file: display_name(generated_path),
        groundtruth_file: display_name(groundtruth_path),
        score,
        summary: classification.summary(),
        plan,
        minor_mistakes: minor_mistake_entries(&classification, generated, groundtruth),
        classification,
    }
}

pub fn render_compare_text(report: &CompareReport, generated: &Grid, groundtruth: &Grid) -> String {
    let mut output = String::new();
    output.push_str(&score_line("Score", &report.score));
    output.push('\n');
    let findings = classification_rows(&report.classification, generated, groundtruth);
    if findings.is_empty() {
        output.push_str("No mismatches found.\n");
    } else {
        let headers = ["kind", "generated", "groundtruth", "value"].map(String::from);
        output.push_str(&table::render_table(&headers, &findings));
    }
    if !report.plan.is_empty() {
        output.push_str(&format!(
            "Rows to add: {:?}; rows to delete: {:?}; columns to add: {:?}; columns to delete: {:?}\n",
            report.plan.rows_to_add,
            report.plan.rows_to_delete,
            report.plan.columns_to_add,
            report.plan.columns_to_delete
        ));
    }
    output
}

pub fn repair_report<'a>(
    generated_path: &Path,
    groundtruth_path: &Path,
    outcome: &'a RepairOutcome,
) -> RepairReport<'a> {
    RepairReport {
        generated_file: display_name(generated_path),
        groundtruth_file: display_name(groundtruth_path),
        initial_score: outcome.initial_score,
        final_score: outcome.final_score,
        summary: outcome.summary,
        operations: &outcome.operations,
        repaired: outcome.repaired_rows(),
    }
}

pub fn render_repair_text(outcome: &RepairOutcome) -> String {
    let mut output = String::new();
    output.push_str(&score_line("Initial score", &outcome.initial_score));
    output.push('\n');
    if outcome.operations.is_empty() {
        output.push_str("No operations applied.\n");
    } else {
        let headers = ["step", "operation", "score"].map(String::from);
        let rows: Vec<Vec<String>> = outcome
            .operations
            .iter()
            .map(|logged| {
                vec![
                    logged.step.to_string(),
                    logged.operation.to_string(),
                    format!("{:.4}", logged.score),
                ]
            })
            .collect();
        output.push_str(&table::render_table(&headers, &rows));
    }
    output.push_str(&score_line("Final score", &outcome.final_score));
    output.push('\n');
    output
}

pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).context("Serializing report")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_marks_removed_and_added_characters() {
        assert_eq!(char_diff("1234", "1284"), "12[-3-]{+8+}4");
        assert_eq!(char_diff("same", "same"), "same");
    }
}
