//! Cell model shared by both grids.
//!
//! A [`DataPoint`] is one grid position: its coordinates, its text as loaded,
//! and the annotations the classification pipeline attaches while matching the
//! generated table against the ground truth. Annotations are reset before every
//! classification pass, so they only ever describe the current grid contents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn distance(self, other: Coord) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Unset,
    Matching,
    GeneratedOnly,
    Missing,
    MergeProblem,
    SplitProblem,
    MinorNumericMistake,
}

impl ValueType {
    fn as_str(self) -> &'static str {
        match self {
            ValueType::Unset => "unset",
            ValueType::Matching => "matching",
            ValueType::GeneratedOnly => "generated-only",
            ValueType::Missing => "missing",
            ValueType::MergeProblem => "merge-problem",
            ValueType::SplitProblem => "split-problem",
            ValueType::MinorNumericMistake => "minor-numeric-mistake",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a cell sits relative to the place its counterpart expects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    None,
    /// Already at its target coordinates ("T").
    InPlace,
    /// Matched, but somewhere else ("F").
    Misplaced,
    /// One fragment of a split value; lists every sibling fragment.
    SplitFrom(Vec<Coord>),
}

/// Coordinates in the opposite grid this cell corresponds to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePlace {
    #[default]
    None,
    Single(Coord),
    Group(Vec<Coord>),
}

impl ReferencePlace {
    pub fn single(&self) -> Option<Coord> {
        match self {
            ReferencePlace::Single(coord) => Some(*coord),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub coords: Coord,
    pub value: String,
    pub value_type: ValueType,
    pub place_type: Placement,
    pub reference_place: ReferencePlace,
    /// Ground-truth value a minor numeric mistake should be corrected to.
    pub expected_value: Option<String>,
    pub middle_place_type: Placement,
    pub middle_reference_place: Option<Coord>,
}

impl DataPoint {
    pub fn new(coords: Coord, value: impl Into<String>) -> Self {
        Self {
            coords,
            value: value.into(),
            value_type: ValueType::Unset,
            place_type: Placement::None,
            reference_place: ReferencePlace::None,
            expected_value: None,
            middle_place_type: Placement::None,
            middle_reference_place: None,
        }
    }

    pub fn empty(coords: Coord) -> Self {
        Self::new(coords, String::new())
    }

    /// Comparison key used by matching, reconstruction and scoring.
    pub fn key(&self) -> String {
        normalize::comparison_key(&self.value)
    }

    pub fn is_empty(&self) -> bool {
        self.key().is_empty()
    }

    pub fn reset_annotations(&mut self) {
        self.value_type = ValueType::Unset;
        self.place_type = Placement::None;
        self.reference_place = ReferencePlace::None;
        self.expected_value = None;
        self.middle_place_type = Placement::None;
        self.middle_reference_place = None;
    }

    /// Blanks the value and drops everything that described it.
    pub fn blank(&mut self) {
        self.value.clear();
        self.reset_annotations();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_order_row_major() {
        let mut coords = vec![Coord::new(1, 0), Coord::new(0, 2), Coord::new(0, 1)];
        coords.sort();
        assert_eq!(
            coords,
            vec![Coord::new(0, 1), Coord::new(0, 2), Coord::new(1, 0)]
        );
    }

    #[test]
    fn whitespace_only_values_are_empty() {
        assert!(DataPoint::new(Coord::new(0, 0), "   ").is_empty());
        assert!(!DataPoint::new(Coord::new(0, 0), " 4 ").is_empty());
    }

    #[test]
    fn blank_clears_value_and_annotations() {
        let mut point = DataPoint::new(Coord::new(2, 3), "17");
        point.value_type = ValueType::GeneratedOnly;
        point.reference_place = ReferencePlace::Single(Coord::new(0, 0));
        point.blank();
        assert!(point.value.is_empty());
        assert_eq!(point.value_type, ValueType::Unset);
        assert_eq!(point.reference_place, ReferencePlace::None);
        assert_eq!(point.coords, Coord::new(2, 3));
    }
}
