//! Low-level readers used by the workbook decoder.
pub(crate) mod xml;
pub(crate) mod zip;
