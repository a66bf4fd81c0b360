use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors related to A1-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// An A1-style cell range with optional bounds (0-based, inclusive).
///
/// `"B2:D10"` bounds both axes, `"B:D"` only columns, `"2:10"` only rows and
/// a single reference such as `"C3"` only sets the lower bounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Z]*)(\d*)(?::([A-Z]*)(\d*))?$").expect("Hardcode regex pattern"))
}

impl FromStr for Range {
    type Err = RangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_uppercase();
        let captures = range_pattern()
            .captures(&value)
            .filter(|_| !value.is_empty())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let part = |index: usize| captures.get(index).map(|matcher| matcher.as_str()).unwrap_or("");
        let range = Range {
            col_lower_bound: col_to_index(part(1)),
            row_lower_bound: row_to_index(part(2)),
            col_upper_bound: col_to_index(part(3)),
            row_upper_bound: row_to_index(part(4)),
        };
        let inverted_rows = range.row_lower_bound.zip(range.row_upper_bound).is_some_and(|(lower, upper)| lower > upper);
        let inverted_cols = range.col_lower_bound.zip(range.col_upper_bound).is_some_and(|(lower, upper)| lower > upper);
        if inverted_rows || inverted_cols {
            return Err(RangeError::FormatError(value));
        }
        Ok(range)
    }
}

impl Range {
    pub fn contains_row(&self, row: usize) -> bool {
        self.row_lower_bound.map_or(true, |lower| lower <= row) && self.row_upper_bound.map_or(true, |upper| row <= upper)
    }

    pub fn contains_col(&self, col: usize) -> bool {
        self.col_lower_bound.map_or(true, |lower| lower <= col) && self.col_upper_bound.map_or(true, |upper| col <= upper)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.contains_row(row) && self.contains_col(col)
    }

    /// True once `row` lies past the upper row bound.
    pub fn after_rows(&self, row: usize) -> bool {
        self.row_upper_bound.is_some_and(|upper| upper < row)
    }
}
