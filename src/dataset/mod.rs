//! In-memory tabular data: scalar cells, typed columns and tables.
pub mod column;
pub mod range;
pub mod table;
pub mod value;

pub use column::Column;
pub use column::ColumnType;
pub use range::Range;
pub use table::Table;
pub use value::Value;
