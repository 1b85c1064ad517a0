//! Parquet table reader.
//!
//! This module is feature-gated (`parquet`) because Parquet decoding pulls
//! in much heavier dependencies than the CSV and JSON paths. Each Parquet row
//! is converted to a JSON object, so typing follows exactly the same rules
//! as for the other loaders.

use std::fs::File;
use std::path::Path;

use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::Value;

use super::Record;
use crate::error::CocofyError;

/// Reads a table from a single Parquet file.
pub fn read_parquet_table(path: &Path) -> Result<Vec<Record>, CocofyError> {
    let file = File::open(path).map_err(CocofyError::Io)?;
    let reader = SerializedFileReader::new(file).map_err(|source| CocofyError::ParquetParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let row_iter = reader
        .get_row_iter(None)
        .map_err(|source| CocofyError::ParquetParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let mut records = Vec::new();
    for (idx, row_res) in row_iter.enumerate() {
        let row = row_res.map_err(|source| CocofyError::ParquetParse {
            path: path.to_path_buf(),
            message: format!("row {}: {source}", idx + 1),
        })?;

        match row.to_json_value() {
            Value::Object(record) => records.push(record),
            other => {
                return Err(CocofyError::ParquetParse {
                    path: path.to_path_buf(),
                    message: format!("row {}: expected a record, got {other}", idx + 1),
                })
            }
        }
    }

    log::debug!("read {} row(s) from {}", records.len(), path.display());
    Ok(records)
}
