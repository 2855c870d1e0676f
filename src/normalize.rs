//! Cell value normalization.
//!
//! Extracted tables disagree with their ground truth in ways that carry no
//! information: accounting negatives written as `(123)`, trailing `.0` on
//! integers, currency symbols, thousands separators and stray spaces. Cells
//! keep their loaded text; every comparison goes through [`comparison_key()`],
//! which applies these rules to whatever the cell holds now (a merged `"10 0"`
//! keys as `"100"`).

use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

static TRAILING_ZERO: OnceLock<Regex> = OnceLock::new();
static PUNCTUATION: OnceLock<Regex> = OnceLock::new();

fn trailing_zero() -> &'static Regex {
    TRAILING_ZERO.get_or_init(|| Regex::new(r"\.0\b").expect("valid trailing zero pattern"))
}

fn punctuation() -> &'static Regex {
    PUNCTUATION.get_or_init(|| Regex::new(r"[^\w\s.]").expect("valid punctuation pattern"))
}

/// Rewrites `(123)` as `-123`; anything else is returned untouched.
pub fn parenthesized_negative(value: &str) -> Cow<'_, str> {
    if let Some(inner) = value
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        && !inner.is_empty()
        && inner.chars().all(|ch| ch.is_ascii_digit())
    {
        return Cow::Owned(format!("-{inner}"));
    }
    Cow::Borrowed(value)
}

/// Drops `.0` before a word boundary, punctuation other than `.`, and all whitespace.
pub fn strip_formatting(value: &str) -> String {
    let without_zero = trailing_zero().replace_all(value, "");
    let without_punctuation = punctuation().replace_all(&without_zero, "");
    without_punctuation
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect()
}

pub fn normalize_cell(raw: &str) -> String {
    strip_formatting(&parenthesized_negative(raw))
}

pub fn comparison_key(value: &str) -> String {
    normalize_cell(value)
}
