//! Repair operations: how candidates are derived from the current annotations
//! and how each one rewrites the generated grid.
//!
//! Operations address cells by coordinates rather than by reference, so the
//! same operation can be replayed on any copy of the state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    align::StructuralPlan,
    cell::{Coord, Placement, ReferencePlace, ValueType},
    classify::Classification,
    grid::Grid,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceValue {
    pub coords: Coord,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "params", rename_all = "snake_case")]
pub enum Operation {
    Clear {
        point: Coord,
    },
    Move {
        point: Coord,
        target: Coord,
    },
    Merge {
        points: Vec<Coord>,
    },
    Split {
        points: Vec<Coord>,
        reference: Vec<ReferenceValue>,
    },
    ModifyMinorNumMistake {
        point: Coord,
        value: String,
    },
    AddValueInEmptyCell {
        point: Coord,
        target: Coord,
        value: String,
    },
    AddRow {
        index: usize,
    },
    AddColumn {
        index: usize,
    },
    DeleteRow {
        index: usize,
    },
    DeleteColumn {
        index: usize,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Clear { .. } => "clear",
            Operation::Move { .. } => "move",
            Operation::Merge { .. } => "merge",
            Operation::Split { .. } => "split",
            Operation::ModifyMinorNumMistake { .. } => "modify_minor_num_mistake",
            Operation::AddValueInEmptyCell { .. } => "add_value_in_empty_cell",
            Operation::AddRow { .. } => "add_row",
            Operation::AddColumn { .. } => "add_column",
            Operation::DeleteRow { .. } => "delete_row",
            Operation::DeleteColumn { .. } => "delete_column",
        }
    }

    /// Applies the operation to `generated`, keeping `plan` in step with any
    /// structural change.
    pub fn apply(&self, generated: &mut Grid, plan: &mut StructuralPlan) {
        match self {
            Operation::Clear { point } => {
                if let Some(cell) = generated.get_mut(*point) {
                    cell.blank();
                }
            }
            Operation::Move { point, target } => move_value(generated, *point, *target),
            Operation::Merge { points } => merge(generated, points),
            Operation::Split { points, reference } => split(generated, points, reference),
            Operation::ModifyMinorNumMistake { point, value } => {
                if let Some(cell) = generated.get_mut(*point) {
                    cell.value = value.clone();
                    cell.value_type = ValueType::Matching;
                    cell.expected_value = None;
                }
            }
            Operation::AddValueInEmptyCell {
                point,
                target,
                value,
            } => {
                if let Some(cell) = generated.get_mut(*target) {
                    cell.value = value.clone();
                    cell.middle_place_type = Placement::InPlace;
                    cell.middle_reference_place = Some(*point);
                }
            }
            Operation::AddRow { index } => {
                generated.insert_row(*index);
                plan.row_inserted(*index);
            }
            Operation::AddColumn { index } => {
                generated.insert_column(*index);
                plan.column_inserted(*index);
            }
            Operation::DeleteRow { index } => {
                if generated.remove_row(*index) {
                    generated.insert_row(generated.rows());
                }
                plan.row_deleted(*index);
            }
            Operation::DeleteColumn { index } => {
                if generated.remove_column(*index) {
                    generated.insert_column(generated.cols());
                }
                plan.column_deleted(*index);
            }
        }
    }
}

fn join_coords(coords: &[Coord]) -> String {
    coords
        .iter()
        .map(Coord::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Clear { point } => write!(f, "clear {point}"),
            Operation::Move { point, target } => write!(f, "move {point} -> {target}"),
            Operation::Merge { points } => write!(f, "merge {}", join_coords(points)),
            Operation::Split { points, reference } => {
                let values = reference
                    .iter()
                    .map(|r| format!("{}={:?}", r.coords, r.value))
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "split {} into {values}", join_coords(points))
            }
            Operation::ModifyMinorNumMistake { point, value } => {
                write!(f, "modify_minor_num_mistake {point} = {value:?}")
            }
            Operation::AddValueInEmptyCell {
                point,
                target,
                value,
            } => write!(f, "add_value_in_empty_cell {point} -> {target} = {value:?}"),
            Operation::AddRow { index } => write!(f, "add_row {index}"),
            Operation::AddColumn { index } => write!(f, "add_column {index}"),
            Operation::DeleteRow { index } => write!(f, "delete_row {index}"),
            Operation::DeleteColumn { index } => write!(f, "delete_column {index}"),
        }
    }
}

fn move_value(generated: &mut Grid, point: Coord, target: Coord) {
    let Some(source) = generated.get_mut(point) else {
        return;
    };
    let value = std::mem::take(&mut source.value);
    let value_type = source.value_type;
    let reference = std::mem::take(&mut source.reference_place);
    source.blank();

    if let Some(destination) = generated.get_mut(target) {
        destination.place_type = if reference.single() == Some(target) {
            Placement::InPlace
        } else {
            Placement::Misplaced
        };
        destination.value = value;
        destination.value_type = value_type;
        destination.reference_place = reference;
    }
}

fn merge(generated: &mut Grid, points: &[Coord]) {
    let Some((&first, rest)) = points.split_first() else {
        return;
    };
    let joined = points
        .iter()
        .filter_map(|&coords| generated.value(coords))
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(cell) = generated.get_mut(first) {
        cell.value = joined;
        cell.value_type = ValueType::Unset;
        cell.place_type = Placement::None;
    }
    for &coords in rest {
        if let Some(cell) = generated.get_mut(coords) {
            cell.blank();
        }
    }
}

fn split(generated: &mut Grid, points: &[Coord], reference: &[ReferenceValue]) {
    for &coords in points {
        if let Some(cell) = generated.get_mut(coords) {
            cell.blank();
            if let Some(found) = reference.iter().find(|r| r.coords == coords) {
                cell.value = found.value.clone();
            }
        }
    }
}

/// Enumerates every operation the current annotations allow, in a fixed order:
/// merge-mistake fixes, split-mistake fixes, missing-value fills, per-cell
/// fixes in row-major order, then the pending structural edits.
pub fn generate(
    classification: &Classification,
    generated: &Grid,
    groundtruth: &Grid,
    plan: &StructuralPlan,
) -> Vec<Operation> {
    let mut operations = Vec::new();

    for mistake in &classification.merge_mistakes {
        let merged = mistake.generated;
        let siblings_empty = mistake
            .groundtruth
            .iter()
            .filter(|&&coords| coords != merged)
            .all(|&coords| generated.get(coords).is_none_or(|cell| cell.is_empty()));
        if siblings_empty {
            let mut points = vec![merged];
            points.extend(
                mistake
                    .groundtruth
                    .iter()
                    .copied()
                    .filter(|&coords| coords != merged && generated.contains(coords)),
            );
            let reference = mistake
                .groundtruth
                .iter()
                .filter_map(|&coords| {
                    groundtruth.value(coords).map(|value| ReferenceValue {
                        coords,
                        value: value.to_string(),
                    })
                })
                .collect();
            operations.push(Operation::Split { points, reference });
        } else {
            operations.push(Operation::Clear { point: merged });
        }
    }

    for mistake in &classification.split_mistakes {
        let filled: Vec<Coord> = mistake
            .generated
            .iter()
            .copied()
            .filter(|&coords| generated.get(coords).is_some_and(|cell| !cell.is_empty()))
            .collect();
        if filled.len() == mistake.generated.len() {
            operations.push(Operation::Merge {
                points: mistake.generated.clone(),
            });
        } else {
            operations.extend(filled.into_iter().map(|point| Operation::Clear { point }));
        }
    }

    for &missing in &classification.missing {
        if !generated.is_empty_at(missing) {
            continue;
        }
        if let Some(value) = groundtruth.value(missing) {
            operations.push(Operation::AddValueInEmptyCell {
                point: missing,
                target: missing,
                value: value.to_string(),
            });
        }
    }

    for cell in generated.cells() {
        match cell.value_type {
            ValueType::GeneratedOnly => operations.push(Operation::Clear { point: cell.coords }),
            ValueType::Matching if cell.place_type == Placement::Misplaced => {
                if let ReferencePlace::Single(target) = cell.reference_place
                    && generated.is_empty_at(target)
                {
                    operations.push(Operation::Move {
                        point: cell.coords,
                        target,
                    });
                }
            }
            ValueType::MinorNumericMistake => {
                if let Some(value) = &cell.expected_value {
                    operations.push(Operation::ModifyMinorNumMistake {
                        point: cell.coords,
                        value: value.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    operations.extend(
        plan.rows_to_delete
            .iter()
            .map(|&index| Operation::DeleteRow { index }),
    );
    operations.extend(
        plan.columns_to_delete
            .iter()
            .map(|&index| Operation::DeleteColumn { index }),
    );
    operations.extend(plan.rows_to_add.iter().map(|&index| Operation::AddRow { index }));
    operations.extend(
        plan.columns_to_add
            .iter()
            .map(|&index| Operation::AddColumn { index }),
    );
    operations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        let owned: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();
        Grid::from_rows(&owned)
    }

    #[test]
    fn merge_joins_with_spaces_into_the_first_fragment() {
        let mut generated = grid(&[&["10", "0", "x"]]);
        let mut plan = StructuralPlan::default();
        Operation::Merge {
            points: vec![Coord::new(0, 0), Coord::new(0, 1)],
        }
        .apply(&mut generated, &mut plan);
        assert_eq!(generated.row_values(0), vec!["10 0", "", "x"]);
    }

    #[test]
    fn move_marks_target_in_place() {
        let mut generated = grid(&[&["", "7"]]);
        generated.get_mut(Coord::new(0, 1)).unwrap().reference_place =
            ReferencePlace::Single(Coord::new(0, 0));
        Operation::Move {
            point: Coord::new(0, 1),
            target: Coord::new(0, 0),
        }
        .apply(&mut generated, &mut StructuralPlan::default());
        let moved = generated.get(Coord::new(0, 0)).unwrap();
        assert_eq!(moved.value, "7");
        assert_eq!(moved.place_type, Placement::InPlace);
        assert!(generated.is_empty_at(Coord::new(0, 1)));
    }

    #[test]
    fn delete_row_keeps_the_grid_shape() {
        let mut generated = grid(&[&["a"], &["b"], &["c"]]);
        Operation::DeleteRow { index: 0 }.apply(&mut generated, &mut StructuralPlan::default());
        assert_eq!(generated.rows(), 3);
        assert_eq!(generated.to_rows(), vec![vec!["b"], vec!["c"], vec![""]]);
    }

    #[test]
    fn operations_serialize_with_name_and_params() {
        let json = serde_json::to_string(&Operation::AddRow { index: 2 }).unwrap();
        assert_eq!(json, r#"{"operation":"add_row","params":{"index":2}}"#);
    }
}
