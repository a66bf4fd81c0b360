use crate::dataset::Column;
use crate::dataset::Range;
use crate::dataset::Table;
use crate::dataset::Value;
use crate::error::DashboardError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use std::collections::HashMap;
use std::collections::HashSet;

/// Cells collected from one worksheet, in document order.
pub(crate) struct Sheet {
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
    /// Expected data range (user-specified)
    range: Range,
    /// Maximum number of rows, header included
    row_limit: Option<usize>,
    /// Actual data range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str, criteria: &Criteria) -> Self {
        let header_rows = usize::from(criteria.header);
        Sheet {
            name: name.to_owned(),
            cells: Vec::new(),
            range: criteria.range.unwrap_or_default(),
            row_limit: criteria.rows_limit.map(|limit| limit + header_rows),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// True once `row` lies past the range or beyond the row limit;
    /// rows arrive in order, so reading can stop there.
    pub(crate) fn after_row_upper_bound(&self, row: usize) -> bool {
        let is_more_than_limit = self
            .row_lower_bound
            .zip(self.row_limit)
            .is_some_and(|(lower, limit)| lower + limit <= row);
        self.range.after_rows(row) || is_more_than_limit
    }

    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        self.range.contains(row, col) && !self.after_row_upper_bound(row)
    }

    pub(crate) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.is_none_or(|lower| row < lower) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.is_none_or(|upper| upper < row) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.is_none_or(|lower| col < lower) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.is_none_or(|upper| upper < col) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the collected cells out as a table.
    ///
    /// The first row of the used range names the columns when `criteria.header`
    /// is set: blank names become `Unnamed: <index>` and repeated names get a
    /// `.1`, `.2`, ... suffix. Null literals become empty cells.
    pub(crate) fn into_table(self, shared_strings: &[String], criteria: &Criteria) -> Result<Table, DashboardError> {
        let (Some(row_lower), Some(row_upper)) = (self.row_lower_bound, self.row_upper_bound) else {
            return Ok(Table::default());
        };
        let col_lower = self.range.col_lower_bound.or(self.col_lower_bound).unwrap_or(0);
        let col_upper = self.range.col_upper_bound.or(self.col_upper_bound).unwrap_or(col_lower);
        let width = col_upper - col_lower + 1;

        let mut grid = vec![vec![Value::Empty; width]; row_upper - row_lower + 1];
        for cell in &self.cells {
            let value = cell.to_value(shared_strings).map_err(|message| SpreadsheetError::CellValueError {
                sheet: self.name.to_owned(),
                reference: index_to_reference(cell.row, cell.col),
                message,
            })?;
            let value = match value {
                Value::Text(text) if criteria.is_null(&text) => Value::Empty,
                value => value,
            };
            grid[cell.row - row_lower][cell.col - col_lower] = value;
        }

        let mut rows = grid.into_iter();
        let names = if criteria.header {
            let header = rows.next().unwrap_or_default();
            column_names(&header)
        } else {
            (1..=width).map(|index| format!("column{index}")).collect()
        };

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); width];
        for row in rows {
            if criteria.skip_empty_rows && row.iter().all(Value::is_empty) {
                continue;
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        let columns = names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Ok(Table::new(columns)?)
    }
}

/// Turns a header row into unique column names.
fn column_names(header: &[Value]) -> Vec<String> {
    let mut seen = HashSet::<String>::new();
    let mut duplicates = HashMap::<String, usize>::new();
    header
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let base = match value.to_category().trim() {
                "" => format!("Unnamed: {index}"),
                name => name.to_owned(),
            };
            let mut name = base.to_owned();
            while seen.contains(&name) {
                let counter = duplicates.entry(base.to_owned()).or_insert(0);
                *counter += 1;
                name = format!("{base}.{counter}");
            }
            seen.insert(name.to_owned());
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn push(sheet: &mut Sheet, row: usize, col: usize, kind: CellType, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind,
            value: value.to_owned(),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("", &Criteria::default());
        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert_eq!(sheet.into_table(&[], &Criteria::default()).unwrap().columns().len(), 0);
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("", &Criteria::default());
        push(&mut sheet, 1, 1, CellType::InlineString, "a");
        push(&mut sheet, 1, 3, CellType::InlineString, "b");
        push(&mut sheet, 3, 1, CellType::Number, "1");
        push(&mut sheet, 3, 3, CellType::Number, "2");

        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));
    }

    #[test]
    fn header_names_and_blank_rows() {
        let mut sheet = Sheet::new("Data", &Criteria::default());
        push(&mut sheet, 0, 0, CellType::InlineString, "Region");
        push(&mut sheet, 0, 2, CellType::InlineString, "Region");
        push(&mut sheet, 1, 0, CellType::InlineString, "North");
        push(&mut sheet, 1, 1, CellType::Number, "5");
        push(&mut sheet, 3, 2, CellType::InlineString, "x");
        let table = sheet.into_table(&[], &Criteria::default()).unwrap();

        assert_eq!(table.column_names(), vec!["Region", "Unnamed: 1", "Region.1"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("Unnamed: 1").unwrap().values, vec![Value::Number(5.0), Value::Empty]);
    }

    #[test]
    fn keeps_blank_rows_when_asked() {
        let criteria = Criteria {
            skip_empty_rows: false,
            ..Criteria::default()
        };
        let mut sheet = Sheet::new("Data", &criteria);
        push(&mut sheet, 0, 0, CellType::InlineString, "A");
        push(&mut sheet, 1, 0, CellType::Number, "1");
        push(&mut sheet, 3, 0, CellType::Number, "3");
        let table = sheet.into_table(&[], &criteria).unwrap();
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn without_header() {
        let criteria = Criteria {
            header: false,
            ..Criteria::default()
        };
        let mut sheet = Sheet::new("Data", &criteria);
        push(&mut sheet, 0, 0, CellType::Number, "1");
        push(&mut sheet, 0, 1, CellType::InlineString, "NA");
        let table = sheet.into_table(&[], &criteria).unwrap();
        assert_eq!(table.column_names(), vec!["column1", "column2"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn null_literals() {
        let mut criteria = Criteria::default();
        criteria.nulls.insert("NA".to_owned());
        let mut sheet = Sheet::new("Data", &criteria);
        push(&mut sheet, 0, 0, CellType::InlineString, "Name");
        push(&mut sheet, 1, 0, CellType::InlineString, "NA");
        push(&mut sheet, 2, 0, CellType::InlineString, "Bob");
        let table = sheet.into_table(&[], &criteria).unwrap();
        assert_eq!(table.column("Name").unwrap().values, vec![Value::from("Bob")]);
    }

    #[test]
    fn row_limit_counts_data_rows() {
        let criteria = Criteria {
            rows_limit: Some(2),
            ..Criteria::default()
        };
        let mut sheet = Sheet::new("Data", &criteria);
        push(&mut sheet, 0, 0, CellType::InlineString, "A");
        assert!(!sheet.after_row_upper_bound(2));
        assert!(sheet.after_row_upper_bound(3));
    }

    #[test]
    fn invalid_cell_reports_position() {
        let mut sheet = Sheet::new("Data", &Criteria::default());
        push(&mut sheet, 0, 0, CellType::InlineString, "A");
        push(&mut sheet, 1, 0, CellType::SharedString, "9");
        let error = sheet.into_table(&[], &Criteria::default()).unwrap_err();
        assert!(error.to_string().contains("'A2'"), "{error}");
    }
}
