//! Records of a COCO-style detection annotation document.
//!
//! Numeric values that come straight from the input table (box geometry
//! and image dimensions) are kept as [`serde_json::Number`] so integer
//! input is written back as integers and fractional input as floats.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::ids::{AnnotationId, CategoryId, ImageId};

/// The root of an `annotations.json` file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Caller-supplied metadata, passed through unmodified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Map<String, Value>>,

    pub images: Vec<ImageRecord>,

    pub categories: Vec<CategoryRecord>,

    pub annotations: Vec<AnnotationRecord>,
}

impl AnnotationDocument {
    /// Returns true if the document has no images, categories or annotations.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.categories.is_empty() && self.annotations.is_empty()
    }

    /// Looks up an image by id.
    pub fn image(&self, id: ImageId) -> Option<&ImageRecord> {
        self.images.iter().find(|img| img.id == id)
    }

    /// Looks up a category by id.
    pub fn category(&self, id: CategoryId) -> Option<&CategoryRecord> {
        self.categories.iter().find(|cat| cat.id == id)
    }
}

/// One distinct image file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub file_name: String,
    pub width: Number,
    pub height: Number,
}

impl ImageRecord {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: impl Into<Number>,
        height: impl Into<Number>,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width: width.into(),
            height: height.into(),
        }
    }
}

/// One vocabulary entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
}

impl CategoryRecord {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One bounding box on one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub image_id: ImageId,
    pub category_id: CategoryId,

    /// `[x, y, width, height]` with `(x, y)` the top-left corner, in pixels.
    pub bbox: [Number; 4],

    pub area: Number,

    pub iscrowd: i64,

    pub ignore: i64,

    /// Always empty: only boxes are produced.
    #[serde(default)]
    pub segmentation: Vec<Value>,
}

/// Multiplies two table numbers.
///
/// Two integers give an exact integer product; anything else (including an
/// integer product that overflows `i64`) gives the `f64` product. Returns
/// `None` only when the float product is not finite.
pub fn area(width: &Number, height: &Number) -> Option<Number> {
    if let (Some(w), Some(h)) = (width.as_i64(), height.as_i64()) {
        if let Some(product) = w.checked_mul(h) {
            return Some(Number::from(product));
        }
    }
    let w = width.as_f64()?;
    let h = height.as_f64()?;
    Number::from_f64(w * h)
}
