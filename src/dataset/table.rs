use crate::dataset::column::Column;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{name}' has {found} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// An ordered set of equally long named columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Builds a table, rejecting columns whose length differs from the first.
    pub fn new(columns: Vec<Column>) -> Result<Table, TableError> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(column) = columns.iter().find(|column| column.len() != expected) {
                return Err(TableError::RaggedColumn {
                    name: column.name.to_owned(),
                    expected,
                    found: column.len(),
                });
            }
        }
        Ok(Table { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.to_owned()).collect()
    }

    /// Looks up a column by name. Duplicate names resolve to the first.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn first_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Copies the given rows, in the given order, into a new table.
    /// Positions past the end are skipped.
    pub fn take(&self, rows: &[usize]) -> Table {
        let row_count = self.row_count();
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.to_owned(),
                kind: column.kind,
                values: rows
                    .iter()
                    .filter(|row| **row < row_count)
                    .map(|row| column.values[*row].clone())
                    .collect(),
            })
            .collect();
        Table { columns }
    }

    /// Replaces the column with the same name, keeping its position.
    pub(crate) fn replace_column(&mut self, column: Column) {
        if let Some(slot) = self.columns.iter_mut().find(|slot| slot.name == column.name) {
            *slot = column;
        }
    }
}
