use crate::dataset::Range;
use crate::error::DashboardError;
use glob::Pattern;
use std::collections::HashSet;

/// Criteria for selecting and cleaning data while decoding a workbook.
#[derive(Clone, Debug)]
pub struct Criteria {
    /// Treat the first row of the used range as column names.
    pub header: bool,

    /// Sheet name patterns; `None` accepts every sheet.
    pub sheet_name_patterns: Option<Vec<Pattern>>,

    /// Maximum number of sheets to decode.
    pub sheet_limit: Option<usize>,

    /// Cell range to extract from each sheet.
    pub range: Option<Range>,

    /// Maximum number of data rows per sheet.
    pub rows_limit: Option<usize>,

    /// Text values read as empty cells (default: the empty string).
    pub nulls: HashSet<String>,

    /// Read error cells (`#N/A`, `#DIV/0!`, ...) as empty instead of as their literal text.
    pub error_as_null: bool,

    /// Drop rows where every column is empty.
    pub skip_empty_rows: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            header: true,
            sheet_name_patterns: None,
            sheet_limit: None,
            range: None,
            rows_limit: None,
            nulls: HashSet::from([String::new()]),
            error_as_null: false,
            skip_empty_rows: true,
        }
    }
}

impl Criteria {
    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }

    /// Adds a sheet name glob pattern such as `"Sales*"`.
    pub fn with_sheet_pattern(mut self, pattern: &str) -> Result<Self, DashboardError> {
        self.sheet_name_patterns
            .get_or_insert_with(Vec::new)
            .push(Pattern::new(pattern)?);
        Ok(self)
    }

    /// Restricts decoding to an A1-style range such as `"A1:D100"`.
    pub fn with_range(mut self, range: &str) -> Result<Self, DashboardError> {
        self.range = Some(range.parse()?);
        Ok(self)
    }

    pub(crate) fn is_null(&self, text: &str) -> bool {
        self.nulls.contains(text)
    }
}
