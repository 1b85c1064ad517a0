//! Reading and writing `annotations.json`.
//!
//! The writer indents with four spaces and ends the file with a newline.
//! Output depends only on the document, so converting the same table twice
//! yields byte-identical files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::model::AnnotationDocument;
use crate::error::CocofyError;

const INDENT: &[u8] = b"    ";

/// Writes a document to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_annotation_json(path: &Path, document: &AnnotationDocument) -> Result<(), CocofyError> {
    let file = File::create(path).map_err(CocofyError::Io)?;
    let mut writer = BufWriter::new(file);

    serialize_into(&mut writer, document).map_err(|source| CocofyError::AnnotationJsonWrite {
        path: path.to_path_buf(),
        source,
    })?;

    writer.write_all(b"\n").map_err(CocofyError::Io)?;
    writer.flush().map_err(CocofyError::Io)
}

/// Reads a document back from a JSON file.
pub fn read_annotation_json(path: &Path) -> Result<AnnotationDocument, CocofyError> {
    let file = File::open(path).map_err(CocofyError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocofyError::AnnotationJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a document to a JSON string, formatted exactly as the file writer
/// formats it (without the trailing newline).
pub fn to_annotation_string(document: &AnnotationDocument) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    serialize_into(&mut buf, document)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reads a document from a JSON string.
pub fn from_annotation_str(json: &str) -> Result<AnnotationDocument, serde_json::Error> {
    serde_json::from_str(json)
}

fn serialize_into<W: Write>(
    writer: W,
    document: &AnnotationDocument,
) -> Result<(), serde_json::Error> {
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    document.serialize(&mut serializer)
}
