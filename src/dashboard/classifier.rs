//! Column Classifier: splits a table's columns into categorical, numeric and
//! date-like roles, promoting mostly-date text columns to date-time values.

use crate::dataset::Column;
use crate::dataset::ColumnType;
use crate::dataset::Table;
use crate::dataset::Value;
use serde::Serialize;
use tracing::debug;

/// Role sets of a classified table, each in column order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ColumnRoles {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub date: Vec<String>,
}

impl ColumnRoles {
    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|column| column == name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|column| column == name)
    }

    pub fn is_date(&self, name: &str) -> bool {
        self.date.iter().any(|column| column == name)
    }
}

/// A classified table: promoted date columns already hold date-time values.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub table: Table,
    pub roles: ColumnRoles,
}

/// Classifies every column of `table`.
///
/// The date test runs first: a column is date-like when it is declared as
/// date-time, or when it is text (or of mixed kinds) and strictly more than
/// half of its non-empty cells are date-times or parse as dates. Promoted columns are rebuilt from the parsed values,
/// unparseable cells becoming empty. Remaining number columns are numeric and
/// everything else is categorical. Classification never fails.
pub fn classify(table: &Table) -> Classification {
    let mut roles = ColumnRoles::default();
    let mut columns = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let name = column.name.to_owned();
        if column.kind.is_datetime() {
            roles.date.push(name);
            columns.push(column.clone());
        } else if let Some(promoted) = promote_dates(column) {
            debug!(column = %column.name, "promoted text column to dates");
            roles.date.push(name);
            columns.push(promoted);
        } else if column.kind.is_number() {
            roles.numeric.push(name);
            columns.push(column.clone());
        } else {
            roles.categorical.push(name);
            columns.push(column.clone());
        }
    }
    debug!(
        categorical = roles.categorical.len(),
        numeric = roles.numeric.len(),
        date = roles.date.len(),
        "classified columns"
    );
    // Promotion keeps every column's length, so the rebuilt table is never ragged.
    let table = Table::new(columns).unwrap_or_else(|_| table.clone());
    Classification { table, roles }
}

/// Parses a mixed or text column as dates, keeping cells that already hold
/// date-times. Returns `None` when the dates are not a strict majority of the
/// non-empty cells.
fn promote_dates(column: &Column) -> Option<Column> {
    if column.kind != ColumnType::Text {
        return None;
    }
    let parsed: Vec<Option<_>> = column
        .values
        .iter()
        .map(Value::as_datetime)
        .collect();
    let present = column.count_present();
    let dates = parsed.iter().filter(|value| value.is_some()).count();
    if dates * 2 <= present {
        return None;
    }
    Some(Column::new(column.name.to_owned(), parsed.into_iter().map(Value::from).collect()))
}
