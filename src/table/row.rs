//! Typed extraction of observation rows from loosely typed records.

use serde_json::{Number, Value};

use super::Record;
use crate::error::CocofyError;

/// Columns every input row must carry.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "filename",
    "x",
    "y",
    "width",
    "height",
    "image_width",
    "image_height",
    "label",
    "iscrowd",
    "ignore",
];

/// One annotated region of one image.
///
/// Geometry and image dimensions are kept as JSON numbers so they can be
/// written out in the same integer/float form they were read in.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationRow {
    /// Identifies the image the region belongs to.
    pub filename: String,
    pub x: Number,
    pub y: Number,
    pub width: Number,
    pub height: Number,
    pub image_width: Number,
    pub image_height: Number,
    /// Category name; only names in the vocabulary become annotations.
    pub label: String,
    pub iscrowd: i64,
    /// Non-zero excludes the row from every output collection.
    pub ignore: i64,
}

impl ObservationRow {
    /// Convenience constructor for integer geometry, mostly for tests and
    /// callers that build rows in code.
    pub fn new(
        filename: impl Into<String>,
        bbox: [i64; 4],
        image_size: (i64, i64),
        label: impl Into<String>,
        iscrowd: i64,
        ignore: i64,
    ) -> Self {
        let [x, y, width, height] = bbox;
        Self {
            filename: filename.into(),
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
            image_width: image_size.0.into(),
            image_height: image_size.1.into(),
            label: label.into(),
            iscrowd,
            ignore,
        }
    }

    /// Extracts a row from a record.
    ///
    /// `row` is the 1-based row number used in error messages. A field that
    /// is absent or `null` is a [`CocofyError::MissingField`]; a field that
    /// cannot be read as the expected kind is a
    /// [`CocofyError::InvalidField`]. Extra fields are ignored.
    pub fn from_record(row: usize, record: &Record) -> Result<Self, CocofyError> {
        Ok(Self {
            filename: text(record, row, "filename")?,
            x: number(record, row, "x")?,
            y: number(record, row, "y")?,
            width: number(record, row, "width")?,
            height: number(record, row, "height")?,
            image_width: number(record, row, "image_width")?,
            image_height: number(record, row, "image_height")?,
            label: text(record, row, "label")?,
            iscrowd: flag(record, row, "iscrowd")?,
            ignore: flag(record, row, "ignore")?,
        })
    }

    /// Returns true if the row takes part in the conversion.
    pub fn is_kept(&self) -> bool {
        self.ignore == 0
    }
}

fn field<'a>(record: &'a Record, row: usize, name: &'static str) -> Result<&'a Value, CocofyError> {
    match record.get(name) {
        None | Some(Value::Null) => Err(CocofyError::MissingField { row, field: name }),
        Some(value) => Ok(value),
    }
}

fn invalid(row: usize, field: &'static str, message: String) -> CocofyError {
    CocofyError::InvalidField {
        row,
        field,
        message,
    }
}

fn text(record: &Record, row: usize, name: &'static str) -> Result<String, CocofyError> {
    match field(record, row, name)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid(row, name, format!("expected a string, got {other}"))),
    }
}

fn number(record: &Record, row: usize, name: &'static str) -> Result<Number, CocofyError> {
    match field(record, row, name)? {
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(CocofyError::MissingField { row, field: name });
            }
            parse_number(s).ok_or_else(|| invalid(row, name, format!("'{s}' is not a number")))
        }
        other => Err(invalid(row, name, format!("expected a number, got {other}"))),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

fn flag(record: &Record, row: usize, name: &'static str) -> Result<i64, CocofyError> {
    let value = field(record, row, name)?;
    let parsed = match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => integral(n),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => return Err(CocofyError::MissingField { row, field: name }),
            "true" => Some(1),
            "false" => Some(0),
            other => parse_number(other).as_ref().and_then(integral),
        },
        _ => None,
    };
    parsed.ok_or_else(|| invalid(row, name, format!("expected an integer flag, got {value}")))
}

fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
}
