//! Bulk edit applier.
//!
//! Applies JSON edit instructions (`{fileName, action, details}`) to a grid
//! whose row 0 is the header row. Row-oriented `index` values count data rows
//! from 1, so they coincide with grid rows; column indices are plain grid
//! columns. A bad instruction is reported as an [`EditError`] and skipped, it
//! never aborts the batch.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{cell::Coord, cli::EditArgs, grid::Grid, io_utils};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDetails {
    pub row: Option<usize>,
    pub col: Option<usize>,
    pub index: Option<usize>,
    pub amount: Option<usize>,
    pub old_val: Option<Value>,
    pub new_val: Option<Value>,
    pub is_row: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInstruction {
    pub file_name: Option<String>,
    pub action: String,
    #[serde(default)]
    pub details: EditDetails,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("'{action}' requires details.{field}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },
    #[error("row {row} is outside the table ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("column {col} is outside the table ({cols} columns)")]
    ColumnOutOfRange { col: usize, cols: usize },
    #[error("cannot merge {axis} {index} with the next one")]
    NothingToMerge { axis: &'static str, index: usize },
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

fn required(
    value: Option<usize>,
    action: &'static str,
    field: &'static str,
) -> Result<usize, EditError> {
    value.ok_or(EditError::MissingField { action, field })
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn apply_instruction(grid: &mut Grid, instruction: &EditInstruction) -> Result<(), EditError> {
    let details = &instruction.details;
    let amount = details.amount.unwrap_or(1);
    match instruction.action.as_str() {
        "edit" => {
            let row = required(details.row, "edit", "row")?;
            let col = required(details.col, "edit", "col")?;
            if row >= grid.rows() {
                return Err(EditError::RowOutOfRange {
                    row,
                    rows: grid.rows(),
                });
            }
            if col >= grid.cols() {
                return Err(EditError::ColumnOutOfRange {
                    col,
                    cols: grid.cols(),
                });
            }
            let coords = Coord::new(row, col);
            if let Some(expected) = &details.old_val {
                let expected = render(expected);
                let current = grid.value(coords).unwrap_or_default();
                if current != expected {
                    warn!(
                        "Value mismatch at {coords}: expected '{expected}', found '{current}'; applying anyway"
                    );
                }
            }
            let value = details.new_val.as_ref().map(render).unwrap_or_default();
            grid.set_value(coords, value);
            Ok(())
        }
        "remove_row" => {
            let index = required(details.index, "remove_row", "index")?;
            if grid.remove_rows(index, amount) == 0 {
                return Err(EditError::RowOutOfRange {
                    row: index,
                    rows: grid.rows(),
                });
            }
            Ok(())
        }
        "remove_col" => {
            let index = required(details.index, "remove_col", "index")?;
            if grid.remove_columns(index, amount) == 0 {
                return Err(EditError::ColumnOutOfRange {
                    col: index,
                    cols: grid.cols(),
                });
            }
            Ok(())
        }
        "add_row" => {
            let index = required(details.index, "add_row", "index")?;
            grid.insert_rows(index, amount);
            Ok(())
        }
        "add_col" => {
            grid.insert_columns(details.index.unwrap_or(0), amount);
            Ok(())
        }
        "merge" => {
            let index = required(details.index, "merge", "index")?;
            if details.is_row.unwrap_or(true) {
                merge_rows(grid, index)
            } else {
                merge_columns(grid, index)
            }
        }
        other => Err(EditError::UnknownAction(other.to_string())),
    }
}

/// Concatenates data rows `index` and `index + 1` cell by cell.
fn merge_rows(grid: &mut Grid, index: usize) -> Result<(), EditError> {
    let nothing = EditError::NothingToMerge { axis: "row", index };
    let (Some(first), Some(second)) = (index.checked_add(1), index.checked_add(2)) else {
        return Err(nothing);
    };
    if second >= grid.rows() {
        return Err(nothing);
    }
    for col in 0..grid.cols() {
        let lower = grid.value(Coord::new(second, col)).unwrap_or_default().to_string();
        if let Some(point) = grid.get_mut(Coord::new(first, col)) {
            point.value.push_str(&lower);
        }
    }
    grid.remove_row(second);
    Ok(())
}

fn merge_columns(grid: &mut Grid, index: usize) -> Result<(), EditError> {
    let next = index
        .checked_add(1)
        .filter(|&next| next < grid.cols())
        .ok_or(EditError::NothingToMerge {
            axis: "column",
            index,
        })?;
    for row in 0..grid.rows() {
        let separator = if row == 0 { "_" } else { " " };
        let left = grid.value(Coord::new(row, index)).unwrap_or_default();
        let right = grid.value(Coord::new(row, next)).unwrap_or_default();
        let joined = if !left.is_empty() && !right.is_empty() {
            format!("{left}{separator}{right}")
        } else {
            format!("{left}{right}")
        };
        grid.set_value(Coord::new(row, index), joined);
    }
    grid.remove_column(next);
    Ok(())
}

/// Applies every instruction in order, logging and skipping failures.
/// Returns how many were applied.
pub fn apply_all(grid: &mut Grid, instructions: &[EditInstruction]) -> usize {
    let mut applied = 0;
    for (idx, instruction) in instructions.iter().enumerate() {
        match apply_instruction(grid, instruction) {
            Ok(()) => applied += 1,
            Err(err) => warn!(
                "Skipping instruction {} ({}): {err}",
                idx + 1,
                instruction.action
            ),
        }
    }
    applied
}

pub fn load_instructions(path: &Path) -> Result<Vec<EditInstruction>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Reading edit instructions from {path:?}"))?;
    serde_json::from_str(&text).with_context(|| format!("Parsing edit instructions in {path:?}"))
}

/// Finds the table an instruction's `fileName` refers to: the exact name, or
/// else the first `<stem>*.csv` in sorted order.
pub fn resolve_table(folder: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let exact = folder.join(file_name);
    if exact.is_file() {
        return Ok(Some(exact));
    }
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let mut candidates = Vec::new();
    for entry in fs::read_dir(folder).with_context(|| format!("Listing folder {folder:?}"))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(stem) && name.to_ascii_lowercase().ends_with(".csv") {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

fn edited_path(table: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let stem = table
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Table path {table:?} has no file name"))?;
    let file_name = format!("{stem}_edited.csv");
    Ok(match output {
        Some(folder) => folder.join(file_name),
        None => table.with_file_name(file_name),
    })
}

pub fn execute(args: &EditArgs) -> Result<()> {
    let instructions = load_instructions(&args.instructions)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    if let Some(output) = &args.output {
        fs::create_dir_all(output)
            .with_context(|| format!("Creating output folder {output:?}"))?;
    }

    let mut by_file: BTreeMap<String, Vec<EditInstruction>> = BTreeMap::new();
    for instruction in instructions {
        match &instruction.file_name {
            Some(name) => by_file.entry(name.clone()).or_default().push(instruction),
            None => warn!("Instruction '{}' has no fileName; skipping", instruction.action),
        }
    }

    for (file_name, group) in &by_file {
        let Some(table) = resolve_table(&args.input, file_name)? else {
            warn!("No table found for {file_name}; skipping");
            continue;
        };
        let delimiter = io_utils::resolve_input_delimiter(&table, args.delimiter);
        let mut grid = io_utils::load_grid(&table, delimiter, encoding)?;
        let applied = apply_all(&mut grid, group);
        let destination = edited_path(&table, args.output.as_deref())?;
        io_utils::write_grid(Some(&destination), delimiter, &grid)?;
        info!(
            "Applied {applied}/{} instruction(s) to {table:?}; wrote {destination:?}",
            group.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Grid {
        Grid::from_rows(&[
            vec!["Item", "Q1", "Q2"],
            vec!["Revenue", "10", "12"],
            vec!["Cost", "4", "5"],
            vec!["Profit", "6", "7"],
        ])
    }

    fn instruction(action: &str, details: Value) -> EditInstruction {
        EditInstruction {
            file_name: Some("t.csv".into()),
            action: action.into(),
            details: serde_json::from_value(details).expect("details"),
        }
    }

    #[test]
    fn null_new_value_clears_the_cell() {
        let mut grid = table();
        apply_instruction(
            &mut grid,
            &instruction("edit", json!({"row": 1, "col": 1, "oldVal": 99, "newVal": null})),
        )
        .expect("edit applies despite mismatch");
        assert_eq!(grid.value(Coord::new(1, 1)), Some(""));
    }

    #[test]
    fn numeric_new_values_are_rendered_as_text() {
        let mut grid = table();
        apply_instruction(&mut grid, &instruction("edit", json!({"row": 2, "col": 2, "newVal": 5.5})))
            .expect("edit");
        assert_eq!(grid.value(Coord::new(2, 2)), Some("5.5"));
    }

    #[test]
    fn removal_is_clamped_to_the_table() {
        let mut grid = table();
        apply_instruction(&mut grid, &instruction("remove_row", json!({"index": 2, "amount": 10})))
            .expect("remove");
        assert_eq!(grid.rows(), 2);
    }

    #[test]
    fn merging_rows_concatenates_without_separator() {
        let mut grid = table();
        apply_instruction(&mut grid, &instruction("merge", json!({"index": 0})))
            .expect("merge rows");
        assert_eq!(grid.row_values(1), vec!["RevenueCost", "104", "125"]);
        assert_eq!(grid.rows(), 3);
    }

    #[test]
    fn merging_columns_joins_headers_with_underscore() {
        let mut grid = table();
        apply_instruction(&mut grid, &instruction("merge", json!({"index": 1, "isRow": false})))
            .expect("merge columns");
        assert_eq!(grid.row_values(0), vec!["Item", "Q1_Q2"]);
        assert_eq!(grid.row_values(1), vec!["Revenue", "10 12"]);
    }

    #[test]
    fn invalid_instructions_are_typed_errors() {
        let mut grid = table();
        assert_eq!(
            apply_instruction(&mut grid, &instruction("merge", json!({"index": 2}))),
            Err(EditError::NothingToMerge { axis: "row", index: 2 })
        );
        assert_eq!(
            apply_instruction(&mut grid, &instruction("explode", json!({}))),
            Err(EditError::UnknownAction("explode".into()))
        );
        assert_eq!(apply_all(&mut grid, &[instruction("remove_col", json!({"index": 9}))]), 0);
    }

    #[test]
    fn merge_at_largest_index_is_rejected_without_touching_the_grid() {
        let mut grid = table();
        for is_row in [true, false] {
            let axis = if is_row { "row" } else { "column" };
            assert_eq!(
                apply_instruction(
                    &mut grid,
                    &instruction("merge", json!({"index": usize::MAX, "isRow": is_row})),
                ),
                Err(EditError::NothingToMerge {
                    axis,
                    index: usize::MAX
                })
            );
        }
        assert_eq!(grid, table());
    }
}
