//! Error taxonomy.
//!
//! Every user-facing operation is isolated per column or per action, so each
//! failure class has its own type and none of them is fatal to the process.

use thiserror::Error;

use crate::dataset::{MAX_COLUMNS, MAX_ROWS};

/// Ingestion failed; the previously loaded dataset (if any) is left unchanged.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Unsupported file format{}. Use .csv, .xlsx, or .json", .0.as_deref().map(|e| format!(" '.{}'", e)).unwrap_or_default())]
    UnsupportedFormat(Option<String>),
    #[error("No data found in file")]
    EmptyDataset,
    #[error("No columns found in data")]
    NoColumns,
    #[error("Dataset too large: {rows} rows and {columns} columns (max {} rows or {} columns)", MAX_ROWS, MAX_COLUMNS)]
    DatasetTooLarge { rows: usize, columns: usize },
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Error reading file: {0}")]
    Io(String),
}

/// A column has no usable values for the requested aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoDataError {
    #[error("No valid data for this column")]
    EmptyColumn,
    #[error("No valid numerical data")]
    NoNumericValues,
    #[error("No valid categorical data")]
    NoCategories,
    #[error("Statistics are only available for numerical columns")]
    NotNumerical,
}

/// Chart construction failed for one column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Unable to render chart: render target '{0}' has no drawable area")]
    EmptyTarget(String),
    #[error("{0}")]
    Backend(String),
}

/// Image or data export failed; no partial output is left behind.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No chart rendered for column '{0}'")]
    NoChart(String),
    #[error("No charts to export")]
    EmptyDashboard,
    #[error("No dataset loaded")]
    NoDataset,
    #[error("Error drawing image: {0}")]
    Render(String),
    #[error("Error writing data: {0}")]
    Encode(String),
    #[error("{0}")]
    Io(String),
}

/// Dashboard-level request errors (bad selection, unknown column).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("No dataset loaded")]
    NoDataset,
    #[error("Select at least one column")]
    EmptySelection,
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),
    #[error("Column '{0}' is not on the dashboard")]
    NotSelected(String),
}

/// Per-column failure shown inline in that column's panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    #[error(transparent)]
    NoData(#[from] NoDataError),
    #[error("Error rendering chart: {0}")]
    Render(#[from] RenderError),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(crate::error_display::user_message_from_io(&err, None))
    }
}

impl From<std::io::Error> for IngestionError {
    fn from(err: std::io::Error) -> Self {
        IngestionError::Io(crate::error_display::user_message_from_io(&err, None))
    }
}

impl From<polars::prelude::PolarsError> for ExportError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ExportError::Encode(crate::error_display::user_message_from_polars(&err))
    }
}
