use crate::dataset::Column;
use crate::dataset::Table;
use crate::dataset::Value;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Inclusive numeric bounds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub lo: f64,
    pub hi: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Inclusive date bounds. Both ends are compared at midnight.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_at(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn end_at(&self) -> NaiveDateTime {
        self.end.and_time(NaiveTime::MIN)
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.start_at() <= value && value <= self.end_at()
    }
}

/// The user's current choices on the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub category_column: Option<String>,
    pub numeric_column: Option<String>,
    pub date_column: Option<String>,
    /// Category values to keep; empty keeps everything.
    pub selected_categories: Option<BTreeSet<String>>,
    pub numeric_range: Option<NumericRange>,
    pub date_range: Option<DateRange>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category_column(mut self, column: impl Into<String>) -> Self {
        self.category_column = Some(column.into());
        self
    }

    pub fn with_numeric_column(mut self, column: impl Into<String>) -> Self {
        self.numeric_column = Some(column.into());
        self
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_numeric_range(mut self, lo: f64, hi: f64) -> Self {
        self.numeric_range = Some(NumericRange { lo, hi });
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange { start, end });
        self
    }

    /// Parses a selection sent by the interaction surface as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Rows that survived the filters.
#[derive(Clone, Debug, PartialEq)]
pub struct FilteredTable {
    pub table: Table,
    /// Position of every kept row in the unfiltered table
    pub rows: Vec<usize>,
}

/// Runs the category, date and numeric filters, in that order.
///
/// The date column of the result is coerced to date-times whenever it is
/// selected, with unparseable cells left empty.
pub fn apply_filters(table: &Table, selection: &FilterSelection) -> FilteredTable {
    let mut rows: Vec<usize> = (0..table.row_count()).collect();

    let categories = selection.selected_categories.as_ref().filter(|categories| !categories.is_empty());
    if let Some((column, categories)) = lookup(table, &selection.category_column).zip(categories) {
        rows.retain(|row| categories.contains(&column.values[*row].to_category()));
        debug!(column = %column.name, rows = rows.len(), "category filter");
    }

    let dates = lookup(table, &selection.date_column);
    if let Some((column, range)) = dates.zip(selection.date_range) {
        rows.retain(|row| column.values[*row].as_datetime().is_some_and(|date| range.contains(date)));
        debug!(column = %column.name, rows = rows.len(), "date filter");
    }

    if let Some((column, range)) = lookup(table, &selection.numeric_column).zip(selection.numeric_range) {
        rows.retain(|row| column.values[*row].as_number().is_some_and(|number| range.contains(number)));
        debug!(column = %column.name, rows = rows.len(), "numeric filter");
    }

    let mut filtered = table.take(&rows);
    if let Some(column) = dates {
        let coerced = rows
            .iter()
            .map(|row| Value::from(column.values[*row].as_datetime()))
            .collect();
        filtered.replace_column(Column::new(column.name.to_owned(), coerced));
    }
    FilteredTable { table: filtered, rows }
}

/// Sum of the column's numeric cells over `rows`, skipping missing values.
/// An empty sum is `0.0`, never `-0.0`.
pub(crate) fn sum_rows(column: &Column, rows: impl IntoIterator<Item = usize>) -> f64 {
    rows.into_iter()
        .filter_map(|row| column.values.get(row).and_then(Value::as_number))
        .fold(0.0, |sum, number| sum + number)
}

pub(crate) fn lookup<'a>(table: &'a Table, column: &Option<String>) -> Option<&'a Column> {
    column.as_deref().and_then(|name| table.column(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sales() -> Table {
        Table::new(vec![
            Column::new("Date", vec![
                Value::from(date(1)),
                Value::from("2024-01-02"),
                Value::from("not a date"),
                Value::from(date(3).and_hms_opt(12, 0, 0).unwrap()),
            ]),
            Column::new("Category", vec![Value::from("A"), Value::from("B"), Value::from("A"), Value::Number(1.0)]),
            Column::new("Value", vec![Value::Number(10.0), Value::from("20"), Value::Number(30.0), Value::Empty]),
        ])
        .unwrap()
    }

    #[test]
    fn no_selection_keeps_everything() {
        let filtered = apply_filters(&sales(), &FilterSelection::new());
        assert_eq!(filtered.rows, vec![0, 1, 2, 3]);
        assert_eq!(filtered.table, sales());
    }

    #[test]
    fn empty_category_set_is_ignored() {
        let selection = FilterSelection::new()
            .with_category_column("Category")
            .with_categories(Vec::<String>::new());
        assert_eq!(apply_filters(&sales(), &selection).rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn categories_match_as_strings() {
        let selection = FilterSelection::new().with_category_column("Category").with_categories(["A", "1"]);
        assert_eq!(apply_filters(&sales(), &selection).rows, vec![0, 2, 3]);
    }

    #[test]
    fn date_range_compares_at_midnight() {
        let selection = FilterSelection::new()
            .with_date_column("Date")
            .with_date_range(date(2), date(3));
        let filtered = apply_filters(&sales(), &selection);
        assert_eq!(filtered.rows, vec![1]);
        assert_eq!(filtered.table.column("Date").unwrap().values, vec![Value::from(date(2))]);
    }

    #[test]
    fn selected_date_column_is_coerced() {
        let filtered = apply_filters(&sales(), &FilterSelection::new().with_date_column("Date"));
        let dates = &filtered.table.column("Date").unwrap().values;
        assert_eq!(dates[1], Value::from(date(2)));
        assert_eq!(dates[2], Value::Empty);
    }

    #[test]
    fn numeric_range_drops_missing() {
        let selection = FilterSelection::new().with_numeric_column("Value").with_numeric_range(15.0, 30.0);
        let filtered = apply_filters(&sales(), &selection);
        assert_eq!(filtered.rows, vec![1, 2]);
        assert_eq!(filtered.table.row_count(), 2);
    }

    #[test]
    fn filters_narrow_in_order() {
        let selection = FilterSelection::new()
            .with_category_column("Category")
            .with_categories(["A"])
            .with_numeric_column("Value")
            .with_numeric_range(0.0, 15.0);
        assert_eq!(apply_filters(&sales(), &selection).rows, vec![0]);
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let selection = FilterSelection::new()
            .with_category_column("Missing")
            .with_categories(["A"])
            .with_date_column("Nope")
            .with_date_range(date(1), date(1));
        assert_eq!(apply_filters(&sales(), &selection).rows.len(), 4);
    }

    #[test]
    fn selection_from_json() {
        let selection = FilterSelection::from_json(
            r#"{"category_column":"Category","selected_categories":["A"],"date_range":{"start":"2024-01-02","end":"2024-01-03"}}"#,
        )
        .unwrap();
        assert_eq!(selection.category_column.as_deref(), Some("Category"));
        assert_eq!(selection.date_range, Some(DateRange { start: date(2), end: date(3) }));
        assert_eq!(selection.numeric_range, None);
    }

    #[test]
    fn sums_numeric_cells() {
        let table = sales();
        let column = table.column("Value").unwrap();
        assert_eq!(sum_rows(column, 0..4), 60.0);
        assert_eq!(sum_rows(column, [3, 9]), 0.0);
    }
}
