//! # Rusty Dashboard
//!
//! Spreadsheet-driven dashboard metrics in pure Rust. An uploaded XLSX workbook
//! is decoded into one table per sheet, the selected sheet's columns are
//! classified as categorical, numeric or date-like, and every filter change
//! produces KPIs plus four chart-ready aggregates.
//!
//! ## Features
//!
//! - **Workbook decoding**: XLSX/XLSM read from memory, with shared strings,
//!   inline strings, booleans, error cells and date number formats (1900 and
//!   1904 date systems)
//! - **Column classification**: text columns whose values are mostly dates are
//!   promoted to date-times
//! - **Filter pipeline**: category subset, inclusive date range and numeric range,
//!   applied in that order
//! - **KPIs**: total, mean and period-over-period growth, or a record count
//! - **Charts**: time trend, totals and shares per category, value histogram,
//!   each with its own fallback
//!
//! ## Example
//!
//! ```rust,no_run
//! use rusty_dashboard::FilterSelection;
//! use rusty_dashboard::Session;
//!
//! # fn main() -> Result<(), rusty_dashboard::DashboardError> {
//! let mut session = Session::default();
//! let sheets = session.upload("data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,...")?;
//! let options = session.select_sheet(&sheets[0])?;
//! let selection = FilterSelection::new()
//!     .with_numeric_column(options.numeric_columns[0].as_str())
//!     .with_categories(options.categories);
//! let metrics = session.update(&selection)?;
//! println!("{}", metrics.kpis[0].formatted_value);
//! # Ok(())
//! # }
//! ```

pub mod dashboard;
pub mod dataset;
pub mod error;
mod helpers;
pub mod logging;
pub mod session;
pub mod spreadsheet;

pub use dashboard::classifier::classify;
pub use dashboard::classifier::Classification;
pub use dashboard::classifier::ColumnRoles;
pub use dashboard::config::DashboardConfig;
pub use dashboard::filter::FilterSelection;
pub use dashboard::MetricsBuilder;
pub use dashboard::MetricsResult;
pub use dataset::Table;
pub use dataset::Value;
pub use error::DashboardError;
pub use session::Session;
pub use spreadsheet::criteria::Criteria;
pub use spreadsheet::decode_workbook;
pub use spreadsheet::Workbook;
