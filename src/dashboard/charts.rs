//! Chart-ready aggregates over a filtered table.
//!
//! Every aggregate degrades on its own: a missing column role selects the
//! fallback chart, and so does a grouping failure, which is logged.

use crate::dashboard::classifier::ColumnRoles;
use crate::dashboard::config::DashboardConfig;
use crate::dashboard::filter::lookup;
use crate::dashboard::filter::sum_rows;
use crate::dashboard::filter::FilterSelection;
use crate::dashboard::filter::FilteredTable;
use crate::dataset::Column;
use crate::dataset::Value;
use chrono::DateTime;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

const TREND_TITLE: &str = "Time Trend";
const INDEX_TREND_TITLE: &str = "Trend";
const SHARES_TITLE: &str = "Share (%)";
const FALLBACK_HISTOGRAM_TITLE: &str = "Histogram";
const FALLBACK_SHARES_TITLE: &str = "Distribution";
const HISTOGRAM_TITLE: &str = "Value Distribution";

#[derive(Error, Debug, PartialEq)]
pub enum ChartError {
    #[error("Column '{0}' mixes values of different kinds and cannot be grouped")]
    MixedCategoryKinds(String),
}

/// Horizontal position of a trend point.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisValue {
    /// Row position in the unfiltered table
    Index(usize),
    Date(NaiveDateTime),
    Missing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    pub x: AxisValue,
    pub y: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendChart {
    pub title: String,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub points: Vec<TrendPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryPoint {
    pub category: String,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub title: String,
    pub category_column: String,
    pub value_column: String,
    pub points: Vec<CategoryPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryChart {
    Totals(CategoryTotals),
    Histogram(HistogramChart),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShareSlice {
    pub label: String,
    pub value: f64,
    /// Percentage of the sum of all slices; absent when that sum is zero
    pub share: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShareChart {
    pub title: String,
    pub label_column: Option<String>,
    /// `None` when slices are record counts
    pub value_column: Option<String>,
    pub slices: Vec<ShareSlice>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// A histogram bin over a date column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DateBin {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramBars {
    /// Equal-width bins over numeric values
    Bins(Vec<HistogramBin>),
    /// Equal-width bins over the timestamps of a date column
    DateBins(Vec<DateBin>),
    /// Occurrences of each distinct value, in first-appearance order
    Counts(Vec<CategoryCount>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramChart {
    pub title: String,
    pub column: Option<String>,
    pub bars: HistogramBars,
}

/// Numeric series ordered by date, or by row position without a date column.
pub fn trend(filtered: &FilteredTable, selection: &FilterSelection) -> TrendChart {
    let table = &filtered.table;
    let numeric = lookup(table, &selection.numeric_column);
    if let Some((dates, numbers)) = lookup(table, &selection.date_column).zip(numeric) {
        let mut order: Vec<usize> = (0..table.row_count()).collect();
        // Stable sort; rows without a date go last
        order.sort_by(|a, b| match (dates.values[*a].as_datetime(), dates.values[*b].as_datetime()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        let points = order
            .into_iter()
            .map(|row| TrendPoint {
                x: dates.values[row].as_datetime().map_or(AxisValue::Missing, AxisValue::Date),
                y: numbers.values[row].as_number(),
            })
            .collect();
        return TrendChart {
            title: TREND_TITLE.to_owned(),
            x_column: Some(dates.name.to_owned()),
            y_column: Some(numbers.name.to_owned()),
            points,
        };
    }

    let column = numeric.or_else(|| table.first_column());
    let points: Vec<TrendPoint> = column
        .map(|column| {
            filtered
                .rows
                .iter()
                .zip(&column.values)
                .map(|(row, value)| TrendPoint {
                    x: AxisValue::Index(*row),
                    y: value.as_number(),
                })
                .collect()
        })
        .unwrap_or_default();
    TrendChart {
        title: INDEX_TREND_TITLE.to_owned(),
        x_column: None,
        y_column: column.map(|column| column.name.to_owned()),
        points,
    }
}

/// Numeric totals per category, or a histogram of the numeric (or first)
/// column without a category column.
pub fn category_totals(
    filtered: &FilteredTable,
    roles: &ColumnRoles,
    selection: &FilterSelection,
    config: &DashboardConfig,
) -> CategoryChart {
    let table = &filtered.table;
    let columns = lookup(table, &selection.category_column).zip(lookup(table, &selection.numeric_column));
    if let Some((categories, numbers)) = columns {
        match group_totals(categories, numbers) {
            Ok(points) => {
                return CategoryChart::Totals(CategoryTotals {
                    title: format!("Comparison by {}", categories.name),
                    category_column: categories.name.to_owned(),
                    value_column: numbers.name.to_owned(),
                    points,
                });
            }
            Err(error) => warn!(%error, "category totals fall back to a histogram"),
        }
    }
    let column = lookup(table, &selection.numeric_column).or_else(|| table.first_column());
    CategoryChart::Histogram(histogram(FALLBACK_HISTOGRAM_TITLE, column, roles, config.fallback_histogram_bins))
}

/// Category totals as shares of their sum, or the first column's value
/// counts without a category column.
pub fn category_shares(filtered: &FilteredTable, selection: &FilterSelection) -> ShareChart {
    let table = &filtered.table;
    let columns = lookup(table, &selection.category_column).zip(lookup(table, &selection.numeric_column));
    if let Some((categories, numbers)) = columns {
        match group_totals(categories, numbers) {
            Ok(points) => {
                let slices = points
                    .into_iter()
                    .map(|point| ShareSlice {
                        label: point.category,
                        value: point.value,
                        share: None,
                    })
                    .collect();
                return ShareChart {
                    title: SHARES_TITLE.to_owned(),
                    label_column: Some(categories.name.to_owned()),
                    value_column: Some(numbers.name.to_owned()),
                    slices: with_shares(slices),
                };
            }
            Err(error) => warn!(%error, "category shares fall back to value counts"),
        }
    }
    let column = table.first_column();
    let slices = column
        .map(|column| {
            value_counts(column)
                .into_iter()
                .map(|count| ShareSlice {
                    label: count.category,
                    value: count.count as f64,
                    share: None,
                })
                .collect()
        })
        .unwrap_or_default();
    ShareChart {
        title: FALLBACK_SHARES_TITLE.to_owned(),
        label_column: column.map(|column| column.name.to_owned()),
        value_column: None,
        slices: with_shares(slices),
    }
}

/// Distribution of the numeric (or first) column.
pub fn value_histogram(
    filtered: &FilteredTable,
    roles: &ColumnRoles,
    selection: &FilterSelection,
    config: &DashboardConfig,
) -> HistogramChart {
    let table = &filtered.table;
    let column = lookup(table, &selection.numeric_column).or_else(|| table.first_column());
    histogram(HISTOGRAM_TITLE, column, roles, Some(config.histogram_bins))
}

/// Sums `numbers` per distinct non-empty value of `categories`, ordered by key.
fn group_totals(categories: &Column, numbers: &Column) -> Result<Vec<CategoryPoint>, ChartError> {
    let mut rows: Vec<usize> = (0..categories.len())
        .filter(|row| !is_missing_key(&categories.values[*row]))
        .collect();
    let mut kinds = rows.iter().map(|row| std::mem::discriminant(&categories.values[*row]));
    if let Some(first) = kinds.next() {
        if kinds.any(|kind| kind != first) {
            return Err(ChartError::MixedCategoryKinds(categories.name.to_owned()));
        }
    }

    rows.sort_by(|a, b| compare_keys(&categories.values[*a], &categories.values[*b]));
    let mut points = Vec::<CategoryPoint>::new();
    let mut start = 0usize;
    while start < rows.len() {
        let key = &categories.values[rows[start]];
        let end = rows[start..]
            .iter()
            .position(|row| compare_keys(&categories.values[*row], key) != Ordering::Equal)
            .map_or(rows.len(), |offset| start + offset);
        points.push(CategoryPoint {
            category: key.to_category(),
            value: sum_rows(numbers, rows[start..end].iter().copied()),
        });
        start = end;
    }
    Ok(points)
}

fn is_missing_key(value: &Value) -> bool {
    match value {
        Value::Empty => true,
        Value::Number(number) => number.is_nan(),
        _ => false,
    }
}

/// Orders two keys of the same kind.
fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn with_shares(mut slices: Vec<ShareSlice>) -> Vec<ShareSlice> {
    let total: f64 = slices.iter().map(|slice| slice.value).sum();
    if total != 0.0 && total.is_finite() {
        for slice in &mut slices {
            slice.share = Some(slice.value / total * 100.0);
        }
    }
    slices
}

/// Histogram with `bins` equal-width bins (Sturges' rule when `None`) over a
/// numeric or date column; value counts for any other column.
fn histogram(title: &str, column: Option<&Column>, roles: &ColumnRoles, bins: Option<usize>) -> HistogramChart {
    let bars = match column {
        Some(column) if roles.is_numeric(&column.name) || column.kind.is_number() => {
            let values: Vec<f64> = column
                .numbers()
                .flatten()
                .filter(|value| value.is_finite())
                .collect();
            let count = bins.unwrap_or_else(|| sturges(values.len()));
            HistogramBars::Bins(equal_width_bins(&values, count))
        }
        Some(column) if roles.is_date(&column.name) || column.kind.is_datetime() => {
            let values: Vec<f64> = column
                .values
                .iter()
                .filter_map(Value::as_datetime)
                .map(|datetime| datetime.and_utc().timestamp_millis() as f64)
                .collect();
            let count = bins.unwrap_or_else(|| sturges(values.len()));
            HistogramBars::DateBins(equal_width_bins(&values, count).into_iter().filter_map(to_date_bin).collect())
        }
        Some(column) => HistogramBars::Counts(value_counts(column)),
        None => HistogramBars::Bins(Vec::new()),
    };
    HistogramChart {
        title: title.to_owned(),
        column: column.map(|column| column.name.to_owned()),
        bars,
    }
}

/// Maps a bin over millisecond timestamps back to date-times.
fn to_date_bin(bin: HistogramBin) -> Option<DateBin> {
    let at = |millis: f64| DateTime::from_timestamp_millis(millis.round() as i64).map(|datetime| datetime.naive_utc());
    Some(DateBin {
        start: at(bin.start)?,
        end: at(bin.end)?,
        count: bin.count,
    })
}

fn sturges(values: usize) -> usize {
    if values == 0 {
        1
    } else {
        (values as f64).log2().ceil() as usize + 1
    }
}

/// Splits `[min, max]` into `count` bins; the last bin includes its upper edge.
/// A single distinct value is centred in a range of width one.
pub(crate) fn equal_width_bins(values: &[f64], count: usize) -> Vec<HistogramBin> {
    let count = count.max(1);
    let Some((mut lo, mut hi)) = values.iter().fold(None, |bounds: Option<(f64, f64)>, value| {
        Some(bounds.map_or((*value, *value), |(lo, hi)| (lo.min(*value), hi.max(*value))))
    }) else {
        return Vec::new();
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / count as f64;
    let mut bins: Vec<HistogramBin> = (0..count)
        .map(|index| HistogramBin {
            start: lo + width * index as f64,
            end: if index + 1 == count { hi } else { lo + width * (index + 1) as f64 },
            count: 0,
        })
        .collect();
    for value in values {
        let index = (((value - lo) / width).floor() as usize).min(count - 1);
        bins[index].count += 1;
    }
    bins
}

/// Occurrences of each distinct non-empty value, in first-appearance order.
fn value_counts(column: &Column) -> Vec<CategoryCount> {
    let mut counts = Vec::<CategoryCount>::new();
    let mut positions = HashMap::<String, usize>::new();
    for value in column.values.iter().filter(|value| !value.is_empty()) {
        let category = value.to_category();
        match positions.get(&category) {
            Some(position) => counts[*position].count += 1,
            None => {
                positions.insert(category.to_owned(), counts.len());
                counts.push(CategoryCount { category, count: 1 });
            }
        }
    }
    counts
}
