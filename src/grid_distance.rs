//! Two-level Levenshtein distance between tables.
//!
//! Rows are the edit unit: inserting or deleting a row costs 1, substituting
//! one row for another costs the cell-level Levenshtein distance between them.
//! Independent of the repair search; used as a second opinion on how far a
//! generated table is from its ground truth.

use std::str::FromStr;

use anyhow::Result;
use log::info;
use rust_decimal::Decimal;

use crate::{cli::DistanceArgs, io_utils};

fn is_numeric_text(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == ',' || ch == '.')
}

/// Cell equality; with `ignore_comma`, `"123,456.70"` equals `"123456.7"`.
pub fn cells_equal(left: &str, right: &str, ignore_comma: bool) -> bool {
    if left == right {
        return true;
    }
    if !ignore_comma || !is_numeric_text(left) || !is_numeric_text(right) {
        return false;
    }
    let parse = |value: &str| Decimal::from_str(&value.replace(',', "")).ok();
    match (parse(left), parse(right)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Classic Levenshtein table over `left` and `right` with a pluggable substitution cost.
fn edit_distance<T>(left: &[T], right: &[T], substitution: impl Fn(&T, &T) -> usize) -> usize {
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0; right.len() + 1];
    for (i, a) in left.iter().enumerate() {
        current[0] = i + 1;
        for (j, b) in right.iter().enumerate() {
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + substitution(a, b));
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[right.len()]
}

pub fn row_levenshtein<S: AsRef<str>>(left: &[S], right: &[S], ignore_comma: bool) -> usize {
    edit_distance(left, right, |a, b| {
        usize::from(!cells_equal(a.as_ref(), b.as_ref(), ignore_comma))
    })
}

pub fn grid_levenshtein<S: AsRef<str>>(
    left: &[Vec<S>],
    right: &[Vec<S>],
    ignore_comma: bool,
) -> usize {
    edit_distance(left, right, |a, b| row_levenshtein(a, b, ignore_comma))
}

pub fn execute(args: &DistanceArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let left_delimiter = io_utils::resolve_input_delimiter(&args.generated, args.delimiter);
    let right_delimiter = io_utils::resolve_input_delimiter(&args.groundtruth, args.delimiter);
    let left = io_utils::load_rows(&args.generated, left_delimiter, encoding)?;
    let right = io_utils::load_rows(&args.groundtruth, right_delimiter, encoding)?;
    let distance = grid_levenshtein(&left, &right, args.ignore_comma);
    info!(
        "2D Levenshtein distance between {:?} and {:?}: {distance}",
        args.generated, args.groundtruth
    );
    println!("{distance}");
    Ok(())
}
