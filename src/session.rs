//! Per-user dashboard state: the uploaded workbook, the active sheet and its
//! classification.

use crate::dashboard::classifier::classify;
use crate::dashboard::classifier::Classification;
use crate::dashboard::classifier::ColumnRoles;
use crate::dashboard::config::DashboardConfig;
use crate::dashboard::filter::FilterSelection;
use crate::dashboard::options::date_bounds;
use crate::dashboard::options::filter_options;
use crate::dashboard::options::DateBounds;
use crate::dashboard::options::FilterOptions;
use crate::dashboard::MetricsBuilder;
use crate::dashboard::MetricsResult;
use crate::error::DashboardError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::decode_workbook;
use crate::spreadsheet::Workbook;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::debug;
use tracing::info;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Sheet '{0}' does not exist")]
    SheetNotFound(String),

    #[error("No sheet selected")]
    NoActiveSheet,

    #[error("No workbook uploaded")]
    EmptyWorkbook,
}

struct ActiveSheet {
    name: String,
    classification: Classification,
}

#[derive(Default)]
pub struct Session {
    criteria: Criteria,
    builder: MetricsBuilder,
    workbook: Workbook,
    active: Option<ActiveSheet>,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        Session {
            builder: MetricsBuilder::new(config),
            ..Session::default()
        }
    }

    /// Decoding criteria for later uploads.
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Accepts an upload encoded as a data URL (`data:<mime>;base64,<payload>`).
    /// Returns the sheet names.
    pub fn upload(&mut self, data_url: &str) -> Result<Vec<String>, DashboardError> {
        let (_, payload) = data_url
            .split_once(',')
            .ok_or_else(|| SessionError::InvalidUpload("expected a data URL".to_owned()))?;
        let bytes = STANDARD.decode(payload.trim())?;
        self.upload_bytes(&bytes)
    }

    /// Replaces the workbook with a newly uploaded one and clears the active sheet.
    pub fn upload_bytes(&mut self, bytes: &[u8]) -> Result<Vec<String>, DashboardError> {
        let workbook = decode_workbook(bytes, &self.criteria)?;
        info!(sheets = workbook.len(), "workbook uploaded");
        self.workbook = workbook;
        self.active = None;
        Ok(self.workbook.sheet_names())
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    pub fn active_sheet(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.name.as_str())
    }

    pub fn roles(&self) -> Option<&ColumnRoles> {
        self.active.as_ref().map(|active| &active.classification.roles)
    }

    /// Makes `name` the active sheet, classifying it, and returns the options
    /// for the filter controls.
    pub fn select_sheet(&mut self, name: &str) -> Result<FilterOptions, DashboardError> {
        let table = self
            .workbook
            .sheet(name)
            .ok_or_else(|| SessionError::SheetNotFound(name.to_owned()))?;
        let classification = classify(table);
        let options = filter_options(&classification.table, &classification.roles);
        debug!(sheet = name, rows = classification.table.row_count(), "sheet selected");
        self.active = Some(ActiveSheet {
            name: name.to_owned(),
            classification,
        });
        Ok(options)
    }

    /// Selects the first sheet of the workbook, the default right after an upload.
    pub fn select_first_sheet(&mut self) -> Result<FilterOptions, DashboardError> {
        let name = self
            .workbook
            .sheet_names()
            .into_iter()
            .next()
            .ok_or(SessionError::EmptyWorkbook)?;
        self.select_sheet(&name)
    }

    /// Date span of a column of the active sheet; `None` without an active
    /// sheet or a parseable date.
    pub fn date_bounds(&self, column: &str) -> Option<DateBounds> {
        self.active
            .as_ref()
            .and_then(|active| date_bounds(&active.classification.table, column))
    }

    /// Recomputes the dashboard of the active sheet for `selection`.
    pub fn update(&self, selection: &FilterSelection) -> Result<MetricsResult, DashboardError> {
        let active = self.active.as_ref().ok_or(SessionError::NoActiveSheet)?;
        let classification = &active.classification;
        Ok(self.builder.build(&classification.table, &classification.roles, selection))
    }
}
