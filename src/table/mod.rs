//! The input side: row-oriented observation tables.
//!
//! A table is a sequence of [`Record`]s, one per annotated region. Loaders
//! keep cells loosely typed; [`ObservationRow::from_record`] checks the
//! required columns and types them just before conversion.

pub mod io_csv;
pub mod io_json;
#[cfg(feature = "parquet")]
pub mod io_parquet;
mod row;

use std::path::Path;

pub use row::{ObservationRow, REQUIRED_COLUMNS};

use crate::error::CocofyError;

/// One row of an input table: column name to cell value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// On-disk layout of an input table.
///
/// This mirrors the CLI's input format flag but is decoupled from clap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
    JsonLines,
    Parquet,
}

impl TableFormat {
    /// Human-readable name for the format.
    pub fn name(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Json => "json",
            TableFormat::JsonLines => "jsonl",
            TableFormat::Parquet => "parquet",
        }
    }

    /// Guesses the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "json" => Some(TableFormat::Json),
            "jsonl" | "ndjson" => Some(TableFormat::JsonLines),
            "parquet" | "pq" => Some(TableFormat::Parquet),
            _ => None,
        }
    }
}

/// Loads a table in the given format.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if Parquet is
/// requested from a build without the `parquet` feature.
pub fn load_table(path: &Path, format: TableFormat) -> Result<Vec<Record>, CocofyError> {
    log::info!("loading {} table from {}", format.name(), path.display());
    match format {
        TableFormat::Csv => io_csv::read_csv_table(path),
        TableFormat::Json => io_json::read_json_table(path),
        TableFormat::JsonLines => io_json::read_jsonl_table(path),
        #[cfg(feature = "parquet")]
        TableFormat::Parquet => io_parquet::read_parquet_table(path),
        #[cfg(not(feature = "parquet"))]
        TableFormat::Parquet => Err(CocofyError::UnsupportedFormat(
            "'parquet' (this build was compiled without the 'parquet' feature)".to_string(),
        )),
    }
}

/// Fuzz-only entrypoint: types every record of a JSON Lines table.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_rows(input: &str) -> Result<(), CocofyError> {
    for (index, record) in io_json::from_jsonl_str(input)?.iter().enumerate() {
        ObservationRow::from_record(index + 1, record)?;
    }
    Ok(())
}
