//! # Spreadsheet decoding
//!
//! Turns an uploaded workbook into one [`Table`] per sheet. XLSX/XLSM packages
//! are read directly from memory; legacy compound-file workbooks (`.xls`, or
//! password-protected packages) are recognised and rejected.

pub(crate) mod cell;
pub mod criteria;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::dataset::Table;
use crate::error::DashboardError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use thiserror::Error;
use tracing::debug;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const COMPOUND_FILE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unknown spreadsheet format")]
    UnknownFormat,

    #[error("Legacy or password-protected workbooks are not supported")]
    CompoundFileFormat,

    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("Workbook contains no worksheets")]
    NoSheets,

    #[error("Invalid value in sheet '{sheet}' at cell '{reference}': {message}")]
    CellValueError {
        sheet: String,
        reference: String,
        message: String,
    },
}

/// Decoded sheets in workbook order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<(String, Table)>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets
            .iter()
            .find(|(sheet_name, _)| sheet_name == name)
            .map(|(_, table)| table)
    }

    pub fn into_sheets(self) -> Vec<(String, Table)> {
        self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Decodes a workbook held in memory.
pub fn decode_workbook(bytes: &[u8], criteria: &Criteria) -> Result<Workbook, DashboardError> {
    if bytes.starts_with(COMPOUND_FILE_MAGIC) {
        Err(SpreadsheetError::CompoundFileFormat)?
    } else if !bytes.starts_with(ZIP_MAGIC) {
        Err(SpreadsheetError::UnknownFormat)?
    }

    let mut workbook = XlsxWorkbook::open(bytes.to_vec())?;
    let sheets = workbook.read_tables(criteria)?;
    debug!(sheets = sheets.len(), bytes = bytes.len(), "decoded workbook");
    Ok(Workbook { sheets })
}
