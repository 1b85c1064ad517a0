//! CSV table reader.
//!
//! The first line is the header. Cells are trimmed and kept as strings;
//! typing happens later in [`ObservationRow::from_record`](super::ObservationRow::from_record),
//! so a numeric-looking file name stays a file name. Empty cells become
//! `null` and therefore count as missing.
//!
//! The header must name every required column. This catches a wrong file
//! even when it has no data rows.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;

use super::row::REQUIRED_COLUMNS;
use super::Record;
use crate::error::CocofyError;

/// Reads a table from a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid CSV, or its
/// header lacks a required column.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocofy::table::io_csv::read_csv_table;
///
/// let records = read_csv_table(Path::new("observations.csv"))?;
/// # Ok::<(), cocofy::CocofyError>(())
/// ```
pub fn read_csv_table(path: &Path) -> Result<Vec<Record>, CocofyError> {
    let file = File::open(path).map_err(CocofyError::Io)?;
    read_records(BufReader::new(file), path)
}

/// Reads a table from a CSV string.
///
/// Useful for testing without file I/O.
pub fn from_csv_str(csv_str: &str) -> Result<Vec<Record>, CocofyError> {
    from_csv_slice(csv_str.as_bytes())
}

/// Reads a table from CSV bytes.
///
/// Useful for fuzzing and processing raw bytes without requiring UTF-8 upfront.
pub fn from_csv_slice(bytes: &[u8]) -> Result<Vec<Record>, CocofyError> {
    read_records(bytes, Path::new("<bytes>"))
}

fn read_records<R: Read>(reader: R, path: &Path) -> Result<Vec<Record>, CocofyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| CocofyError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|column| !headers.iter().any(|h| h == *column))
    {
        return Err(CocofyError::MissingColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(|source| CocofyError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;

        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (name.to_string(), value)
            })
            .collect();
        records.push(record);
    }

    log::debug!("read {} row(s) from {}", records.len(), path.display());
    Ok(records)
}
