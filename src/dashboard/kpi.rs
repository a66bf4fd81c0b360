use crate::dashboard::config::DashboardConfig;
use crate::dashboard::filter::lookup;
use crate::dashboard::filter::sum_rows;
use crate::dashboard::filter::FilterSelection;
use crate::dashboard::filter::FilteredTable;
use crate::dataset::Table;
use chrono::TimeDelta;
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

/// A headline figure shown on its own card.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpi {
    pub icon: &'static str,
    pub label: &'static str,
    /// Raw value; `None` when not available
    pub value: Option<f64>,
    pub formatted_value: String,
    pub color: &'static str,
}

impl Kpi {
    fn new(icon: &'static str, label: &'static str, color: &'static str, value: Option<f64>, formatted_value: String) -> Self {
        Kpi {
            icon,
            label,
            value,
            formatted_value,
            color,
        }
    }
}

/// Total, mean and growth of the numeric column, or the record count when no
/// numeric column is selected.
///
/// Growth compares the filtered total with the total of the unfiltered `table`
/// over the equally long window that ends the day before the selected range.
pub fn compute_kpis(table: &Table, filtered: &FilteredTable, selection: &FilterSelection, config: &DashboardConfig) -> Vec<Kpi> {
    let decimals = config.decimals;
    let Some(numbers) = lookup(&filtered.table, &selection.numeric_column) else {
        let records = filtered.table.row_count();
        return vec![Kpi::new("🧾", "Records", "#117A65", Some(records as f64), records.to_string())];
    };

    let present = numbers.numbers().flatten().count();
    let total = sum_rows(numbers, 0..numbers.len());
    let mean = (present > 0).then(|| total / present as f64);
    let growth = growth(table, selection, total);
    vec![
        Kpi::new("💰", "Total", "#1ABC9C", Some(total), format_thousands(total, decimals)),
        Kpi::new(
            "📊",
            "Mean",
            "#17A589",
            mean,
            mean.map_or_else(|| NOT_AVAILABLE.to_owned(), |mean| format_thousands(mean, decimals)),
        ),
        Kpi::new(
            "📈",
            "Growth",
            "#28B463",
            growth,
            growth.map_or_else(|| NOT_AVAILABLE.to_owned(), |growth| format!("{growth:.decimals$}%")),
        ),
    ]
}

/// Percentage change of `current` against the previous window, or `None`
/// without a date range, when the previous total is zero, or on overflow.
fn growth(table: &Table, selection: &FilterSelection, current: f64) -> Option<f64> {
    let range = selection.date_range?;
    let dates = lookup(table, &selection.date_column)?;
    let numbers = lookup(table, &selection.numeric_column)?;

    let period = TimeDelta::try_days((range.end - range.start).num_days())?.checked_add(&TimeDelta::try_days(1)?)?;
    let previous_end = range.start_at().checked_sub_signed(TimeDelta::try_days(1)?)?;
    let previous_start = range.start_at().checked_sub_signed(period)?;

    let rows = dates
        .values
        .iter()
        .enumerate()
        .filter(|(_, value)| {
            value
                .as_datetime()
                .is_some_and(|date| previous_start <= date && date <= previous_end)
        })
        .map(|(row, _)| row);
    let previous = sum_rows(numbers, rows);
    if previous == 0.0 || !previous.is_finite() {
        return None;
    }
    let growth = (current - previous) / previous.abs() * 100.0;
    growth.is_finite().then_some(growth)
}

/// Formats with a fixed number of decimals and comma thousands separators.
pub(crate) fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = format!("{:.decimals$}", value.abs());
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(digits.len() + integer.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::filter::apply_filters;
    use crate::dataset::Column;
    use crate::dataset::Value;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn daily(values: &[f64]) -> Table {
        Table::new(vec![
            Column::new("Date", (1..=values.len() as u32).map(|day| Value::from(date(day))).collect()),
            Column::new("Value", values.iter().map(|value| Value::Number(*value)).collect()),
        ])
        .unwrap()
    }

    fn kpis(table: &Table, selection: &FilterSelection) -> Vec<Kpi> {
        let filtered = apply_filters(table, selection);
        compute_kpis(table, &filtered, selection, &DashboardConfig::default())
    }

    #[test]
    fn thousands() {
        assert_eq!(format_thousands(0.0, 2), "0.00");
        assert_eq!(format_thousands(999.999, 2), "1,000.00");
        assert_eq!(format_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_thousands(-1234.5, 1), "-1,234.5");
        assert_eq!(format_thousands(123456.0, 0), "123,456");
        assert_eq!(format_thousands(f64::INFINITY, 2), "inf");
    }

    #[test]
    fn records_without_numeric_column() {
        let kpis = kpis(&daily(&[1.0, 2.0]), &FilterSelection::new());
        assert_eq!(kpis, vec![Kpi::new("🧾", "Records", "#117A65", Some(2.0), "2".to_owned())]);
    }

    #[test]
    fn total_and_mean() {
        let kpis = kpis(&daily(&[1000.0, 2000.5]), &FilterSelection::new().with_numeric_column("Value"));
        let labels: Vec<&str> = kpis.iter().map(|kpi| kpi.label).collect();
        assert_eq!(labels, vec!["Total", "Mean", "Growth"]);
        assert_eq!(kpis[0].formatted_value, "3,000.50");
        assert_eq!(kpis[1].formatted_value, "1,500.25");
        assert_eq!(kpis[2].value, None);
        assert_eq!(kpis[2].formatted_value, "N/A");
    }

    #[test]
    fn empty_selection_has_no_mean() {
        let selection = FilterSelection::new().with_numeric_column("Value").with_numeric_range(50.0, 60.0);
        let kpis = kpis(&daily(&[1.0, 2.0]), &selection);
        assert_eq!(kpis[0].value, Some(0.0));
        assert_eq!(kpis[0].formatted_value, "0.00");
        assert_eq!(kpis[1].value, None);
        assert_eq!(kpis[1].formatted_value, "N/A");
    }

    #[test]
    fn growth_against_previous_window() {
        let table = daily(&[10.0, 20.0, 30.0, 60.0]);
        let selection = FilterSelection::new()
            .with_numeric_column("Value")
            .with_date_column("Date")
            .with_date_range(date(3), date(4));
        let kpis = kpis(&table, &selection);
        assert_eq!(kpis[0].value, Some(90.0));
        assert_eq!(kpis[2].value, Some(200.0));
        assert_eq!(kpis[2].formatted_value, "200.00%");
    }

    #[test]
    fn growth_ignores_other_filters_for_the_previous_window() {
        let table = daily(&[10.0, 20.0, 30.0, 60.0]);
        let selection = FilterSelection::new()
            .with_numeric_column("Value")
            .with_numeric_range(40.0, 100.0)
            .with_date_column("Date")
            .with_date_range(date(3), date(4));
        let kpis = kpis(&table, &selection);
        assert_eq!(kpis[0].value, Some(60.0));
        assert_eq!(kpis[2].value, Some(100.0));
    }

    #[test]
    fn growth_with_zero_previous_total_is_not_available() {
        let table = daily(&[0.0, 20.0]);
        let selection = FilterSelection::new()
            .with_numeric_column("Value")
            .with_date_column("Date")
            .with_date_range(date(2), date(2));
        let kpis = kpis(&table, &selection);
        assert_eq!(kpis[2].value, None);
        assert_eq!(kpis[2].formatted_value, "N/A");
    }
}
