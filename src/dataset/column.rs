use crate::dataset::value::Value;
use serde::Serialize;

/// Declared type of a column, detected from the values it holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// No non-empty value at all
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numbers, integral or not
    Number,
    /// Dates and date-times
    DateTime,
    /// Strings, or a mix of kinds
    Text,
}

impl ColumnType {
    /// Detects the common type of a column's values, ignoring empty cells.
    /// Falls back to text when kinds are mixed.
    pub fn detect<'a, I>(values: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut detected = ColumnType::Empty;
        for value in values {
            let kind = match value {
                Value::Empty => continue,
                Value::Number(_) => ColumnType::Number,
                Value::Boolean(_) => ColumnType::Boolean,
                Value::DateTime(_) => ColumnType::DateTime,
                Value::Text(_) => return ColumnType::Text,
            };
            if detected == ColumnType::Empty {
                detected = kind;
            } else if detected != kind {
                return ColumnType::Text;
            }
        }
        detected
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, ColumnType::Number)
    }

    #[inline]
    pub fn is_datetime(&self) -> bool {
        matches!(self, ColumnType::DateTime)
    }
}

/// A named column of cells with its declared type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    pub values: Vec<Value>,
}

impl Column {
    /// Creates a column, detecting its declared type from the values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let kind = ColumnType::detect(&values);
        Column {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of cells holding a value.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|value| !value.is_empty()).count()
    }

    /// Numeric view of every cell, missing where coercion fails.
    pub fn numbers(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().map(Value::as_number)
    }
}
