use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cocofy operations.
#[derive(Debug, Error)]
pub enum CocofyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Schema errors: the input table does not have the required shape ---
    #[error("Row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("Row {row}: invalid value for '{field}': {message}")]
    InvalidField {
        row: usize,
        field: &'static str,
        message: String,
    },

    #[error("Row {row}: box area {width} x {height} is not representable as a JSON number")]
    AreaOverflow {
        row: usize,
        width: serde_json::Number,
        height: serde_json::Number,
    },

    #[error("Table {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    // --- Configuration errors ---
    #[error("Duplicate category '{name}' in vocabulary (positions {first} and {second})")]
    DuplicateCategory {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("Invalid info object: {message}")]
    InvalidInfo { message: String },

    #[error("Image copying is enabled but no image folder was given")]
    MissingImageFolder,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // --- Input parsing ---
    #[error("Failed to parse CSV table from {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse JSON table from {path} (line {line}): {source}")]
    TableJsonParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid JSON table in {path}: {message}")]
    TableJsonInvalid { path: PathBuf, message: String },

    #[cfg(feature = "parquet")]
    #[error("Failed to read Parquet table from {path}: {message}")]
    ParquetParse { path: PathBuf, message: String },

    #[error("Failed to read categories from {path}: {message}")]
    CategoriesParse { path: PathBuf, message: String },

    #[error("Failed to read info from {path}: {message}")]
    InfoParse { path: PathBuf, message: String },

    // --- Output ---
    #[error("Failed to write annotations to {path}: {source}")]
    AnnotationJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse annotations from {path}: {source}")]
    AnnotationJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // --- Run outcomes surfaced by the CLI ---
    #[error("{failed} of {attempted} image(s) could not be copied")]
    CopyFailed { failed: usize, attempted: usize },

    #[error("Conversion produced {warning_count} warning(s) (--strict)")]
    ConversionWarnings { warning_count: usize },
}

impl CocofyError {
    /// Returns true for errors caused by the shape or content of input rows.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            CocofyError::MissingField { .. }
                | CocofyError::InvalidField { .. }
                | CocofyError::AreaOverflow { .. }
                | CocofyError::MissingColumn { .. }
        )
    }

    /// Returns true for errors caused by caller-supplied configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CocofyError::DuplicateCategory { .. }
                | CocofyError::InvalidInfo { .. }
                | CocofyError::MissingImageFolder
                | CocofyError::UnsupportedFormat(_)
        )
    }
}
