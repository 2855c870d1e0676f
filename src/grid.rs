//! Rectangular grid of [`DataPoint`]s.
//!
//! Cells are stored row-major, so the coordinate index is implicit:
//! `row * cols + col`. The row/column insert and remove routines are the only
//! code that changes the grid's shape; they renumber every surviving cell so
//! that `cells[i].coords` always agrees with its position. The repair
//! operations and the bulk edit applier both go through these routines.

use crate::cell::{Coord, DataPoint};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    cells: Vec<DataPoint>,
    rows: usize,
    cols: usize,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        let cells = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| DataPoint::empty(Coord::new(row, col))))
            .collect();
        Self { cells, rows, cols }
    }

    /// Builds a grid from ragged rows, padding every row to the widest one.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let cols = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (row_idx, row) in rows.iter().enumerate() {
            for col in 0..cols {
                let value = row.get(col).map(|v| v.as_ref()).unwrap_or("");
                cells.push(DataPoint::new(Coord::new(row_idx, col), value));
            }
        }
        Self {
            cells,
            rows: rows.len(),
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[DataPoint] {
        &self.cells
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    fn index_of(&self, coord: Coord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.row * self.cols + coord.col)
    }

    pub fn get(&self, coord: Coord) -> Option<&DataPoint> {
        self.index_of(coord).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut DataPoint> {
        self.index_of(coord).map(move |idx| &mut self.cells[idx])
    }

    pub fn value(&self, coord: Coord) -> Option<&str> {
        self.get(coord).map(|point| point.value.as_str())
    }

    /// True when the coordinate is inside the grid and its cell is empty.
    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.get(coord).is_some_and(DataPoint::is_empty)
    }

    pub fn set_value(&mut self, coord: Coord, value: impl Into<String>) -> bool {
        match self.get_mut(coord) {
            Some(point) => {
                point.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn reset_annotations(&mut self) {
        for point in &mut self.cells {
            point.reset_annotations();
        }
    }

    /// Grows the grid with empty cells until it has at least `rows` x `cols`.
    pub fn pad_to(&mut self, rows: usize, cols: usize) {
        if cols > self.cols {
            self.insert_columns(self.cols, cols - self.cols);
        }
        if rows > self.rows {
            self.insert_rows(self.rows, rows - self.rows);
        }
    }

    pub fn insert_rows(&mut self, at: usize, count: usize) {
        let at = at.min(self.rows);
        let mut rows = self.take_rows();
        let blank = (0..count).map(|_| self.blank_row());
        rows.splice(at..at, blank);
        self.restore_rows(rows);
    }

    pub fn insert_row(&mut self, at: usize) {
        self.insert_rows(at, 1);
    }

    /// Removes up to `count` rows starting at `at`; returns how many were removed.
    pub fn remove_rows(&mut self, at: usize, count: usize) -> usize {
        if at >= self.rows {
            return 0;
        }
        let end = at.saturating_add(count).min(self.rows);
        let mut rows = self.take_rows();
        rows.drain(at..end);
        self.restore_rows(rows);
        end - at
    }

    pub fn remove_row(&mut self, at: usize) -> bool {
        self.remove_rows(at, 1) == 1
    }

    pub fn insert_columns(&mut self, at: usize, count: usize) {
        let at = at.min(self.cols);
        let mut rows = self.take_rows();
        for row in &mut rows {
            let blank = (0..count).map(|_| DataPoint::empty(Coord::default()));
            row.splice(at..at, blank);
        }
        self.cols += count;
        self.restore_rows(rows);
    }

    pub fn insert_column(&mut self, at: usize) {
        self.insert_columns(at, 1);
    }

    /// Removes up to `count` columns starting at `at`; returns how many were removed.
    pub fn remove_columns(&mut self, at: usize, count: usize) -> usize {
        if at >= self.cols {
            return 0;
        }
        let end = at.saturating_add(count).min(self.cols);
        let mut rows = self.take_rows();
        for row in &mut rows {
            row.drain(at..end);
        }
        self.cols -= end - at;
        self.restore_rows(rows);
        end - at
    }

    pub fn remove_column(&mut self, at: usize) -> bool {
        self.remove_columns(at, 1) == 1
    }

    pub fn row_values(&self, row: usize) -> Vec<String> {
        if row >= self.rows {
            return Vec::new();
        }
        let start = row * self.cols;
        self.cells[start..start + self.cols]
            .iter()
            .map(|point| point.value.clone())
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<String>> {
        (0..self.rows).map(|row| self.row_values(row)).collect()
    }

    fn blank_row(&self) -> Vec<DataPoint> {
        (0..self.cols)
            .map(|_| DataPoint::empty(Coord::default()))
            .collect()
    }

    fn take_rows(&mut self) -> Vec<Vec<DataPoint>> {
        let cells = std::mem::take(&mut self.cells);
        if self.cols == 0 {
            return (0..self.rows).map(|_| Vec::new()).collect();
        }
        let mut rows = Vec::with_capacity(self.rows);
        let mut iter = cells.into_iter();
        for _ in 0..self.rows {
            rows.push(iter.by_ref().take(self.cols).collect());
        }
        rows
    }

    fn restore_rows(&mut self, rows: Vec<Vec<DataPoint>>) {
        self.rows = rows.len();
        self.cells = rows
            .into_iter()
            .enumerate()
            .flat_map(|(row_idx, row)| {
                row.into_iter().enumerate().map(move |(col_idx, mut point)| {
                    point.coords = Coord::new(row_idx, col_idx);
                    point
                })
            })
            .collect();
    }
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
    fn ragged_rows_are_padded() {
        let grid = grid(&[&["a", "b", "c"], &["d"]]);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.value(Coord::new(1, 2)), Some(""));
    }

    #[test]
    fn inserting_a_row_renumbers_later_cells() {
        let mut grid = grid(&[&["a", "b"], &["c", "d"]]);
        grid.insert_row(1);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.value(Coord::new(2, 1)), Some("d"));
        assert_eq!(grid.get(Coord::new(2, 1)).unwrap().coords, Coord::new(2, 1));
        assert!(grid.is_empty_at(Coord::new(1, 0)));
    }

    #[test]
    fn removing_columns_clamps_to_bounds() {
        let mut grid = grid(&[&["a", "b", "c"], &["d", "e", "f"]]);
        assert_eq!(grid.remove_columns(1, 5), 2);
        assert_eq!(grid.cols(), 1);
        assert_eq!(grid.to_rows(), vec![vec!["a"], vec!["d"]]);
        assert_eq!(grid.remove_columns(3, 1), 0);
    }

    #[test]
    fn pad_to_only_grows() {
        let mut grid = grid(&[&["a"]]);
        grid.pad_to(2, 3);
        assert_eq!((grid.rows(), grid.cols()), (2, 3));
        grid.pad_to(1, 1);
        assert_eq!((grid.rows(), grid.cols()), (2, 3));
        assert_eq!(grid.cell_count(), 6);
    }
}
