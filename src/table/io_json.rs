//! JSON and JSON Lines table readers.
//!
//! Two JSON layouts are accepted:
//! - an array of row objects (`[{"filename": ..., "x": ...}, ...]`, the
//!   "records" orientation most dataframe libraries export), and
//! - an object of equal-length column arrays (`{"filename": [...], "x": [...]}`).
//!
//! JSON Lines holds one row object per line; blank lines are skipped.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::Record;
use crate::error::CocofyError;

/// Reads a table from a JSON file.
pub fn read_json_table(path: &Path) -> Result<Vec<Record>, CocofyError> {
    let text = fs::read_to_string(path).map_err(CocofyError::Io)?;
    parse_json(&text, path)
}

/// Reads a table from a JSON Lines file.
pub fn read_jsonl_table(path: &Path) -> Result<Vec<Record>, CocofyError> {
    let text = fs::read_to_string(path).map_err(CocofyError::Io)?;
    parse_jsonl(&text, path)
}

/// Reads a table from a JSON string.
pub fn from_json_str(json: &str) -> Result<Vec<Record>, CocofyError> {
    parse_json(json, Path::new("<string>"))
}

/// Reads a table from a JSON Lines string.
pub fn from_jsonl_str(jsonl: &str) -> Result<Vec<Record>, CocofyError> {
    parse_jsonl(jsonl, Path::new("<string>"))
}

fn parse_json(text: &str, path: &Path) -> Result<Vec<Record>, CocofyError> {
    let value: Value = serde_json::from_str(text).map_err(|source| CocofyError::TableJsonParse {
        path: path.to_path_buf(),
        line: source.line(),
        source,
    })?;

    match value {
        Value::Array(rows) => rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| into_record(row, path, idx + 1))
            .collect(),
        Value::Object(columns) => transpose_columns(columns, path),
        _ => Err(invalid(path, "expected an array of rows or an object of columns")),
    }
}

fn parse_jsonl(text: &str, path: &Path) -> Result<Vec<Record>, CocofyError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).map_err(|source| CocofyError::TableJsonParse {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
        records.push(into_record(value, path, idx + 1)?);
    }
    Ok(records)
}

fn into_record(value: Value, path: &Path, row: usize) -> Result<Record, CocofyError> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(invalid(
            path,
            &format!("row {row}: expected an object, got {other}"),
        )),
    }
}

fn transpose_columns(
    columns: serde_json::Map<String, Value>,
    path: &Path,
) -> Result<Vec<Record>, CocofyError> {
    let mut len = None;
    let mut arrays = Vec::with_capacity(columns.len());

    for (name, column) in columns {
        let Value::Array(cells) = column else {
            return Err(invalid(path, &format!("column '{name}' is not an array")));
        };
        match len {
            None => len = Some(cells.len()),
            Some(expected) if expected != cells.len() => {
                return Err(invalid(
                    path,
                    &format!(
                        "column '{name}' has {} value(s), expected {expected}",
                        cells.len()
                    ),
                ));
            }
            Some(_) => {}
        }
        arrays.push((name, cells));
    }

    let mut records = vec![Record::new(); len.unwrap_or(0)];
    for (name, cells) in arrays {
        for (record, cell) in records.iter_mut().zip(cells) {
            record.insert(name.clone(), cell);
        }
    }
    Ok(records)
}

fn invalid(path: &Path, message: &str) -> CocofyError {
    CocofyError::TableJsonInvalid {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
