//! Error types for the WHX manifest pipeline.
//!
//! The hierarchy mirrors the pipeline stages:
//!
//! - [`ConvertError`] - Business-rule failures of the core conversion
//! - [`SheetError`] - Reading or writing sheets
//! - [`StageError`] - Either of the above, as raised inside one stage
//! - [`PipelineError`] - Stage-labelled errors returned by the pipeline
//! - [`ConfigError`] - Settings and column-name file errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Conversion Errors
// =============================================================================

/// Fatal business-rule failures. Any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Reference table produced no usable (sku, code) pair.
    #[error("mapping table is empty: {0}")]
    EmptyMapping(String),

    /// Input header lacks one or more required columns.
    #[error("input header missing required columns: {}", .missing.join(", "))]
    MissingRequiredColumn { missing: Vec<String> },

    /// SKU has no entry in the mapping table.
    #[error("row {row}: sku {sku:?} not found in mapping")]
    UnknownSku { row: usize, sku: String },

    /// Quantity cell is not a base-10 integer.
    #[error("row {row}: invalid quantity {value:?}: {source}")]
    InvalidQuantity {
        row: usize,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

// =============================================================================
// Sheet Errors
// =============================================================================

/// Errors while reading or writing a sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read or write a file.
    #[error("sheet IO failed: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("invalid sheet format: {0}")]
    Csv(#[from] csv::Error),

    /// Bytes could not be decoded as text.
    #[error("cannot decode sheet as {0}")]
    Encoding(String),

    /// Unreadable spreadsheet workbook.
    #[error("invalid workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// Workbook could not be rendered.
    #[error("cannot write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// An error raised inside a single pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Top-level pipeline errors, labelled with the stage that failed.
///
/// This is the error type returned by [`crate::transform::pipeline::generate`]
/// and the file-level helpers built on it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input path was empty.
    #[error("input path is required")]
    MissingInput,

    /// Building the mapping table failed.
    #[error("load mapping: {0}")]
    LoadMapping(#[source] StageError),

    /// Reading the input, resolving columns or validating rows failed.
    #[error("prepare rows: {0}")]
    PrepareRows(#[source] StageError),

    /// Rendering or persisting the manifest failed.
    #[error("write workbook: {0}")]
    WriteWorkbook(#[source] StageError),
}

impl PipelineError {
    pub(crate) fn load_mapping(err: impl Into<StageError>) -> Self {
        Self::LoadMapping(err.into())
    }

    pub(crate) fn prepare_rows(err: impl Into<StageError>) -> Self {
        Self::PrepareRows(err.into())
    }

    pub(crate) fn write_workbook(err: impl Into<StageError>) -> Self {
        Self::WriteWorkbook(err.into())
    }

    /// Stage label, as printed in front of the message.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::MissingInput => None,
            Self::LoadMapping(_) => Some("load mapping"),
            Self::PrepareRows(_) => Some("prepare rows"),
            Self::WriteWorkbook(_) => Some("write workbook"),
        }
    }

    /// The business-rule failure behind this error, if there is one.
    pub fn convert_error(&self) -> Option<&ConvertError> {
        match self {
            Self::LoadMapping(StageError::Convert(e))
            | Self::PrepareRows(StageError::Convert(e))
            | Self::WriteWorkbook(StageError::Convert(e)) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure was caused by the uploaded content rather than the host.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::MissingInput => true,
            Self::PrepareRows(_) => true,
            Self::LoadMapping(_) | Self::WriteWorkbook(_) => false,
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Column-name file could not be read.
    #[error("cannot read column names from {path}: {source}")]
    ColumnsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Column-name file is not valid JSON.
    #[error("invalid column names in {path}: {source}")]
    ColumnsJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Listen address does not parse.
    #[error("invalid listen address {0:?}")]
    InvalidAddr(String),

    /// Request timeout is not a positive number of seconds.
    #[error("invalid request timeout {0:?}, expected whole seconds")]
    InvalidTimeout(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("conversion failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for core conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
