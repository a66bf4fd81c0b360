use thiserror::Error;

/// Main error type for the dashboard crate.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Dataset module errors
    #[error("{0}")]
    RangeError(#[from] crate::dataset::range::RangeError),

    #[error("{0}")]
    TableError(#[from] crate::dataset::table::TableError),

    // Session errors
    #[error("{0}")]
    SessionError(#[from] crate::session::SessionError),
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, DashboardError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| DashboardError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_wraps_message() {
        let result: Result<()> = Err(crate::session::SessionError::NoActiveSheet.into());
        let error = result.with_prefix("Sales.xlsx").unwrap_err();
        assert_eq!(error.to_string(), "Sales.xlsx: No sheet selected");
    }

    #[test]
    fn prefix_keeps_success() {
        let result: Result<usize> = Ok(3);
        assert_eq!(result.with_prefix("ignored").unwrap(), 3);
    }
}
