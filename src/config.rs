//! Loading the conversion's configuration files.
//!
//! The category vocabulary and the info object can come from files as well
//! as from code. Both accept YAML (by `.yaml` / `.yml` extension) so a
//! vocabulary can be shared with a YOLO-style `data.yaml`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CocofyError;

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoriesYaml {
    List(Vec<String>),
    Names { names: Vec<String> },
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Reads an ordered category vocabulary.
///
/// - YAML files hold either a list of names or a mapping with a `names` list.
/// - Any other file holds one name per line; blank lines and lines starting
///   with `#` are skipped, surrounding whitespace is trimmed.
///
/// Duplicates are not checked here; building the vocabulary does that.
pub fn load_categories_file(path: &Path) -> Result<Vec<String>, CocofyError> {
    let text = fs::read_to_string(path).map_err(CocofyError::Io)?;
    if is_yaml(path) {
        return parse_categories_yaml(&text).map_err(|message| CocofyError::CategoriesParse {
            path: path.to_path_buf(),
            message,
        });
    }
    Ok(parse_categories_text(&text))
}

fn parse_categories_yaml(text: &str) -> Result<Vec<String>, String> {
    match serde_yaml::from_str::<CategoriesYaml>(text).map_err(|e| e.to_string())? {
        CategoriesYaml::List(names) | CategoriesYaml::Names { names } => Ok(names),
    }
}

fn parse_categories_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads the free-form info object (JSON, or YAML by extension).
///
/// # Errors
/// [`CocofyError::InfoParse`] if the file does not parse, and
/// [`CocofyError::InvalidInfo`] if it parses to something other than an
/// object.
pub fn load_info_file(path: &Path) -> Result<Map<String, Value>, CocofyError> {
    let text = fs::read_to_string(path).map_err(CocofyError::Io)?;
    let parsed: Result<Value, String> = if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    let value = parsed.map_err(|message| CocofyError::InfoParse {
        path: path.to_path_buf(),
        message,
    })?;
    info_object(value)
}

/// Accepts a value as the info object only if it is a JSON object.
pub fn info_object(value: Value) -> Result<Map<String, Value>, CocofyError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CocofyError::InvalidInfo {
            message: format!("expected an object, got {other}"),
        }),
    }
}
