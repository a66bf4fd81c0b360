use crate::dashboard::classifier::ColumnRoles;
use crate::dataset::Table;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// Bounds, initial selection and end marks of the numeric range slider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub value: (f64, f64),
    pub marks: Vec<(f64, String)>,
}

impl Default for SliderRange {
    fn default() -> Self {
        SliderRange {
            min: 0.0,
            max: 1.0,
            value: (0.0, 1.0),
            marks: vec![(0.0, "0".to_owned()), (1.0, "1".to_owned())],
        }
    }
}

/// Everything the filter controls offer once a sheet is selected.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilterOptions {
    pub categorical_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub date_columns: Vec<String>,
    /// Distinct values of the first categorical column
    pub categories: Vec<String>,
    /// Slider over the first numeric column
    pub numeric_range: SliderRange,
}

/// Earliest and latest date of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

pub fn filter_options(table: &Table, roles: &ColumnRoles) -> FilterOptions {
    let categories = roles
        .categorical
        .first()
        .and_then(|name| table.column(name))
        .map(|column| {
            let mut seen = HashSet::<String>::new();
            column
                .values
                .iter()
                .filter(|value| !value.is_empty())
                .map(|value| value.to_category())
                .filter(|category| seen.insert(category.to_owned()))
                .collect()
        })
        .unwrap_or_default();

    let numeric_range = roles
        .numeric
        .first()
        .and_then(|name| table.column(name))
        .and_then(|column| {
            column.numbers().flatten().fold(None, |bounds: Option<(f64, f64)>, value| {
                Some(bounds.map_or((value, value), |(min, max)| (min.min(value), max.max(value))))
            })
        })
        .map(|(min, max)| SliderRange {
            min,
            max,
            value: (min, max),
            marks: vec![(min, mark(min)), (max, mark(max))],
        })
        .unwrap_or_default();

    FilterOptions {
        categorical_columns: roles.categorical.to_owned(),
        numeric_columns: roles.numeric.to_owned(),
        date_columns: roles.date.to_owned(),
        categories,
        numeric_range,
    }
}

/// Date span of `column`, or `None` when it is missing or has no parseable date.
pub fn date_bounds(table: &Table, column: &str) -> Option<DateBounds> {
    table
        .column(column)?
        .values
        .iter()
        .filter_map(|value| value.as_datetime())
        .map(|datetime| datetime.date())
        .fold(None, |bounds: Option<DateBounds>, date| {
            Some(bounds.map_or(DateBounds { min: date, max: date }, |bounds| DateBounds {
                min: bounds.min.min(date),
                max: bounds.max.max(date),
            }))
        })
}

/// Slider label: the value rounded to two decimals.
fn mark(value: f64) -> String {
    format!("{:?}", (value * 100.0).round() / 100.0)
}
