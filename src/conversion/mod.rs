//! Table to COCO conversion.
//!
//! [`convert`] turns observation rows plus a category vocabulary into an
//! [`AnnotationDocument`] and the list of image files it references. It does
//! no I/O; writing the document and copying images is [`crate::export`]'s job.
//!
//! # Id assignment
//!
//! - **Images**: one per distinct file name among kept rows, numbered
//!   `0, 1, 2, ...` in the order the file names first appear.
//! - **Categories**: one per vocabulary entry, numbered by vocabulary
//!   position, whether or not the data uses it. The id space is therefore
//!   stable across runs over different subsets of the same data.
//! - **Annotations**: one per kept row whose label is in the vocabulary,
//!   numbered `0, 1, 2, ...` in row order.
//!
//! Rows with a non-zero `ignore` flag are dropped before any of this.
//! A row whose label is not in the vocabulary produces no annotation, but
//! its file name still produces an image.
//!
//! # Conflicting image dimensions
//!
//! When rows for the same file name disagree on `image_width` or
//! `image_height`, the first row wins. This is not an error; the report
//! carries a [`ConversionIssueCode::ConflictingImageDimensions`] warning and
//! callers should fix the table upstream.

pub mod report;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Number, Value};

use crate::coco::{
    area, AnnotationDocument, AnnotationId, AnnotationRecord, CategoryId, CategoryRecord, ImageId,
    ImageRecord,
};
use crate::error::CocofyError;
use crate::table::{ObservationRow, Record};

/// How many names to spell out in a report message before summarizing.
const LISTED_NAMES: usize = 5;

/// The ordered, duplicate-free list of category names.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    names: Vec<String>,
    ids: HashMap<String, CategoryId>,
}

impl Vocabulary {
    /// Builds a vocabulary, rejecting duplicate names.
    ///
    /// # Errors
    /// Returns [`CocofyError::DuplicateCategory`] naming both positions of
    /// the first repeated name.
    pub fn new<I, S>(names: I) -> Result<Self, CocofyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for (idx, name) in names.into_iter().enumerate() {
            let name = name.into();
            if let Some(first) = vocabulary.ids.get(&name) {
                return Err(CocofyError::DuplicateCategory {
                    name,
                    first: first.as_u64() as usize,
                    second: idx,
                });
            }
            vocabulary
                .ids
                .insert(name.clone(), CategoryId::from_index(idx));
            vocabulary.names.push(name);
        }
        Ok(vocabulary)
    }

    /// Returns the id of a name, if it is in the vocabulary.
    pub fn id(&self, name: &str) -> Option<CategoryId> {
        self.ids.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// One category record per entry, in vocabulary order.
    pub fn records(&self) -> Vec<CategoryRecord> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| CategoryRecord::new(CategoryId::from_index(idx), name.clone()))
            .collect()
    }
}

/// The result of a conversion.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub document: AnnotationDocument,
    /// Distinct file names of kept rows, in first-seen order. Position `i`
    /// is the file of image id `i`.
    pub image_files: Vec<String>,
    pub report: ConversionReport,
}

/// Converts loosely typed table records.
///
/// Every record is checked for the required fields before anything else
/// happens, including records that will be ignored.
///
/// # Errors
/// - [`CocofyError::DuplicateCategory`] if `categories` repeats a name.
/// - [`CocofyError::MissingField`] / [`CocofyError::InvalidField`] if a record
///   lacks a required field or holds a value of the wrong kind. Row numbers
///   in these errors are 1-based.
/// - [`CocofyError::AreaOverflow`] if `width * height` of an annotated row
///   overflows to a non-finite float (e.g. `1e200 x 1e200`). This is the only
///   failure on otherwise well-formed rows.
///
/// # Example
/// ```
/// use cocofy::conversion::convert;
/// use cocofy::table::io_csv::from_csv_str;
///
/// let records = from_csv_str(
///     "filename,x,y,width,height,image_width,image_height,label,iscrowd,ignore\n\
///      a.jpg,1,2,3,4,100,200,cat,0,0\n",
/// )?;
/// let conversion = convert(&records, &["cat"], None)?;
/// assert_eq!(conversion.document.annotations.len(), 1);
/// assert_eq!(conversion.image_files, vec!["a.jpg".to_string()]);
/// # Ok::<(), cocofy::CocofyError>(())
/// ```
pub fn convert<S: AsRef<str>>(
    records: &[Record],
    categories: &[S],
    info: Option<Map<String, Value>>,
) -> Result<Conversion, CocofyError> {
    let vocabulary = Vocabulary::new(categories.iter().map(AsRef::as_ref))?;

    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, record)| ObservationRow::from_record(idx + 1, record))
        .collect::<Result<Vec<_>, _>>()?;

    build(&rows, &vocabulary, info)
}

/// Converts rows that are already typed.
///
/// # Errors
/// Returns [`CocofyError::DuplicateCategory`] if `categories` repeats a name,
/// and [`CocofyError::AreaOverflow`] as described for [`convert`].
pub fn convert_rows<S: AsRef<str>>(
    rows: &[ObservationRow],
    categories: &[S],
    info: Option<Map<String, Value>>,
) -> Result<Conversion, CocofyError> {
    let vocabulary = Vocabulary::new(categories.iter().map(AsRef::as_ref))?;
    build(rows, &vocabulary, info)
}

fn build(
    rows: &[ObservationRow],
    vocabulary: &Vocabulary,
    info: Option<Map<String, Value>>,
) -> Result<Conversion, CocofyError> {
    let mut report = ConversionReport::new();

    // (1-based row number, row) for every row that survives the ignore flag
    let kept: Vec<(usize, &ObservationRow)> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_kept())
        .map(|(idx, row)| (idx + 1, row))
        .collect();

    let (images, image_ids) = build_images(&kept, &mut report);
    let categories = vocabulary.records();

    let mut annotations = Vec::new();
    let mut unlisted: BTreeMap<&str, usize> = BTreeMap::new();
    for &(row_number, row) in &kept {
        let Some(category_id) = vocabulary.id(&row.label) else {
            *unlisted.entry(row.label.as_str()).or_default() += 1;
            continue;
        };
        // every kept file name was registered by build_images
        let image_id = image_ids[row.filename.as_str()];

        let area = area(&row.width, &row.height).ok_or_else(|| CocofyError::AreaOverflow {
            row: row_number,
            width: row.width.clone(),
            height: row.height.clone(),
        })?;

        annotations.push(AnnotationRecord {
            id: AnnotationId::from_index(annotations.len()),
            image_id,
            category_id,
            bbox: [
                row.x.clone(),
                row.y.clone(),
                row.width.clone(),
                row.height.clone(),
            ],
            area,
            iscrowd: row.iscrowd,
            ignore: row.ignore,
            segmentation: Vec::new(),
        });
    }

    report.counts = ConversionCounts {
        rows: rows.len(),
        ignored_rows: rows.len() - kept.len(),
        images: images.len(),
        categories: categories.len(),
        annotations: annotations.len(),
    };
    note_filtering(&mut report, vocabulary, &images, &annotations, &unlisted);

    log::info!(
        "converted {} row(s) into {} image(s), {} category(ies), {} annotation(s)",
        rows.len(),
        images.len(),
        categories.len(),
        annotations.len()
    );

    let image_files = images.iter().map(|img| img.file_name.clone()).collect();
    Ok(Conversion {
        document: AnnotationDocument {
            info,
            images,
            categories,
            annotations,
        },
        image_files,
        report,
    })
}

/// Builds one image record per distinct file name, first occurrence wins.
fn build_images<'a>(
    kept: &[(usize, &'a ObservationRow)],
    report: &mut ConversionReport,
) -> (Vec<ImageRecord>, HashMap<&'a str, ImageId>) {
    let mut images: Vec<ImageRecord> = Vec::new();
    let mut ids: HashMap<&'a str, ImageId> = HashMap::new();
    let mut conflicted: HashSet<&'a str> = HashSet::new();

    for &(row_number, row) in kept {
        match ids.get(row.filename.as_str()) {
            Some(id) => {
                let image = &images[id.as_u64() as usize];
                let same = same_number(&image.width, &row.image_width)
                    && same_number(&image.height, &row.image_height);
                if !same && conflicted.insert(row.filename.as_str()) {
                    log::warn!(
                        "'{}' has conflicting dimensions; keeping the first ({}x{})",
                        row.filename,
                        image.width,
                        image.height
                    );
                    report.add(ConversionIssue::warning(
                        ConversionIssueCode::ConflictingImageDimensions,
                        format!(
                            "'{}': row {} says {}x{}, first occurrence says {}x{} (kept)",
                            row.filename,
                            row_number,
                            row.image_width,
                            row.image_height,
                            image.width,
                            image.height
                        ),
                    ));
                }
            }
            None => {
                let id = ImageId::from_index(images.len());
                ids.insert(row.filename.as_str(), id);
                images.push(ImageRecord::new(
                    id,
                    row.filename.clone(),
                    row.image_width.clone(),
                    row.image_height.clone(),
                ));
            }
        }
    }

    (images, ids)
}

/// Numeric equality that treats `100` and `100.0` as the same value.
fn same_number(a: &Number, b: &Number) -> bool {
    a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

fn note_filtering(
    report: &mut ConversionReport,
    vocabulary: &Vocabulary,
    images: &[ImageRecord],
    annotations: &[AnnotationRecord],
    unlisted: &BTreeMap<&str, usize>,
) {
    if vocabulary.is_empty() {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::EmptyVocabulary,
            "the category vocabulary is empty; no annotations can be produced",
        ));
    }

    let ignored = report.counts.ignored_rows;
    if ignored > 0 {
        report.add(ConversionIssue::info(
            ConversionIssueCode::IgnoredRows,
            format!("{ignored} row(s) with a non-zero ignore flag were excluded"),
        ));
    }

    if !unlisted.is_empty() {
        let total: usize = unlisted.values().sum();
        let labels: Vec<String> = unlisted
            .iter()
            .map(|(label, count)| format!("'{label}' ({count})"))
            .collect();
        report.add(ConversionIssue::info(
            ConversionIssueCode::UnlistedLabels,
            format!(
                "{total} row(s) with labels outside the vocabulary were not annotated: {}",
                summarize(&labels)
            ),
        ));
    }

    let annotated: HashSet<ImageId> = annotations.iter().map(|a| a.image_id).collect();
    let bare: Vec<String> = images
        .iter()
        .filter(|img| !annotated.contains(&img.id))
        .map(|img| format!("'{}'", img.file_name))
        .collect();
    if !bare.is_empty() {
        report.add(ConversionIssue::info(
            ConversionIssueCode::ImagesWithoutAnnotations,
            format!(
                "{} image(s) have no annotations: {}",
                bare.len(),
                summarize(&bare)
            ),
        ));
    }

    let used: HashSet<CategoryId> = annotations.iter().map(|a| a.category_id).collect();
    let unused: Vec<String> = vocabulary
        .names()
        .iter()
        .enumerate()
        .filter(|(idx, _)| !used.contains(&CategoryId::from_index(*idx)))
        .map(|(_, name)| format!("'{name}'"))
        .collect();
    if !unused.is_empty() && !vocabulary.is_empty() {
        report.add(ConversionIssue::info(
            ConversionIssueCode::UnusedCategories,
            format!(
                "{} category(ies) have no annotations: {}",
                unused.len(),
                summarize(&unused)
            ),
        ));
    }
}

fn summarize(names: &[String]) -> String {
    if names.len() <= LISTED_NAMES {
        return names.join(", ");
    }
    format!(
        "{} and {} more",
        names[..LISTED_NAMES].join(", "),
        names.len() - LISTED_NAMES
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::io_json::to_annotation_string;
    use serde_json::json;

    fn row(file: &str, bbox: [i64; 4], label: &str) -> ObservationRow {
        ObservationRow::new(file, bbox, (100, 200), label, 0, 0)
    }

    #[test]
    fn test_mixed_labels_on_one_image() {
        let rows = vec![
            row("a.jpg", [1, 2, 3, 4], "cat"),
            row("a.jpg", [5, 6, 7, 8], "dog"),
        ];
        let conversion = convert_rows(&rows, &["cat"], None).unwrap();
        let doc = &conversion.document;

        assert_eq!(doc.images, vec![ImageRecord::new(0u64, "a.jpg", 100, 200)]);
        assert_eq!(doc.categories, vec![CategoryRecord::new(0u64, "cat")]);
        assert_eq!(doc.annotations.len(), 1);

        let json = serde_json::to_value(&doc.annotations[0]).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 0, "image_id": 0, "category_id": 0,
                "bbox": [1, 2, 3, 4], "area": 12,
                "iscrowd": 0, "ignore": 0, "segmentation": []
            })
        );
        assert_eq!(conversion.image_files, vec!["a.jpg"]);
        assert!(conversion.report.has(ConversionIssueCode::UnlistedLabels));
    }

    #[test]
    fn test_empty_rows_keep_full_vocabulary() {
        let rows: Vec<ObservationRow> = Vec::new();
        let conversion = convert_rows(&rows, &["cat", "dog", "bird"], None).unwrap();
        let doc = &conversion.document;

        assert!(doc.images.is_empty());
        assert!(doc.annotations.is_empty());
        assert!(conversion.image_files.is_empty());
        let names: Vec<&str> = doc.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["cat", "dog", "bird"]);
        let ids: Vec<u64> = doc.categories.iter().map(|c| c.id.as_u64()).collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn test_empty_vocabulary_is_valid_but_warned() {
        let rows = vec![row("a.jpg", [1, 2, 3, 4], "cat")];
        let empty: [&str; 0] = [];
        let conversion = convert_rows(&rows, &empty, None).unwrap();

        assert!(conversion.document.categories.is_empty());
        assert!(conversion.document.annotations.is_empty());
        assert_eq!(conversion.document.images.len(), 1);
        assert!(conversion.report.has(ConversionIssueCode::EmptyVocabulary));
    }

    #[test]
    fn test_ignored_rows_produce_nothing() {
        let rows = vec![
            ObservationRow::new("gone.jpg", [0, 0, 1, 1], (10, 10), "cat", 0, 1),
            row("b.jpg", [1, 1, 2, 2], "cat"),
            ObservationRow::new("b.jpg", [9, 9, 9, 9], (10, 10), "cat", 0, 1),
        ];
        let conversion = convert_rows(&rows, &["cat"], None).unwrap();
        let doc = &conversion.document;

        assert_eq!(conversion.image_files, vec!["b.jpg"]);
        assert_eq!(doc.images[0].id, ImageId(0));
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.annotations[0].ignore, 0);
        assert_eq!(conversion.report.counts.ignored_rows, 2);
        // the ignored b.jpg row disagrees on dimensions but never counts
        assert!(!conversion
            .report
            .has(ConversionIssueCode::ConflictingImageDimensions));
    }

    #[test]
    fn test_ids_follow_first_seen_order() {
        let rows = vec![
            row("z.jpg", [0, 0, 1, 1], "dog"),
            row("a.jpg", [0, 0, 1, 1], "cat"),
            row("z.jpg", [0, 0, 2, 2], "cat"),
            row("m.jpg", [0, 0, 3, 3], "dog"),
        ];
        let conversion = convert_rows(&rows, &["cat", "dog"], None).unwrap();
        let doc = &conversion.document;

        assert_eq!(conversion.image_files, vec!["z.jpg", "a.jpg", "m.jpg"]);
        let image_ids: Vec<u64> = doc.annotations.iter().map(|a| a.image_id.as_u64()).collect();
        assert_eq!(image_ids, [0, 1, 0, 2]);
        let category_ids: Vec<u64> = doc
            .annotations
            .iter()
            .map(|a| a.category_id.as_u64())
            .collect();
        assert_eq!(category_ids, [1, 0, 0, 1]);
        let ids: Vec<u64> = doc.annotations.iter().map(|a| a.id.as_u64()).collect();
        assert_eq!(ids, [0, 1, 2, 3]);
    }

    #[test]
    fn test_category_ids_ignore_data_content() {
        let rows = vec![row("a.jpg", [0, 0, 1, 1], "dog")];
        let conversion = convert_rows(&rows, &["cat", "dog"], None).unwrap();
        assert_eq!(
            conversion.document.annotations[0].category_id,
            CategoryId(1)
        );
        assert!(conversion.report.has(ConversionIssueCode::UnusedCategories));
    }

    #[test]
    fn test_image_from_unlisted_label_only() {
        let rows = vec![
            row("a.jpg", [0, 0, 1, 1], "cat"),
            row("b.jpg", [0, 0, 1, 1], "tree"),
        ];
        let conversion = convert_rows(&rows, &["cat"], None).unwrap();
        assert_eq!(conversion.document.images.len(), 2);
        assert_eq!(conversion.document.annotations.len(), 1);
        assert!(conversion
            .report
            .has(ConversionIssueCode::ImagesWithoutAnnotations));
    }

    #[test]
    fn test_first_dimensions_win() {
        let rows = vec![
            ObservationRow::new("a.jpg", [0, 0, 1, 1], (100, 200), "cat", 0, 0),
            ObservationRow::new("a.jpg", [0, 0, 1, 1], (50, 50), "cat", 0, 0),
            ObservationRow::new("a.jpg", [0, 0, 1, 1], (60, 60), "cat", 0, 0),
        ];
        let conversion = convert_rows(&rows, &["cat"], None).unwrap();
        let image = &conversion.document.images[0];
        assert_eq!(image.width.as_i64(), Some(100));
        assert_eq!(image.height.as_i64(), Some(200));
        // reported once per file name
        assert_eq!(conversion.report.warning_count(), 1);
    }

    #[test]
    fn test_integer_and_float_dimensions_agree() {
        let mut second = row("a.jpg", [0, 0, 1, 1], "cat");
        second.image_width = Number::from_f64(100.0).unwrap();
        let rows = vec![row("a.jpg", [0, 0, 1, 1], "cat"), second];
        let conversion = convert_rows(&rows, &["cat"], None).unwrap();
        assert_eq!(conversion.report.warning_count(), 0);
    }

    #[test]
    fn test_duplicate_category_is_config_error() {
        let rows = vec![row("a.jpg", [0, 0, 1, 1], "cat")];
        let err = convert_rows(&rows, &["cat", "dog", "cat"], None).unwrap_err();
        assert!(matches!(
            err,
            CocofyError::DuplicateCategory {
                first: 0,
                second: 2,
                ..
            }
        ));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_info_is_attached_unmodified() {
        let info = json!({"year": 2021, "version": "1.0", "contributor": "John Smith"});
        let info_map = info.as_object().cloned().unwrap();
        let rows = vec![row("a.jpg", [0, 0, 1, 1], "cat")];
        let conversion = convert_rows(&rows, &["cat"], Some(info_map)).unwrap();

        let json = serde_json::to_value(&conversion.document).unwrap();
        assert_eq!(json["info"], info);
        assert!(json["images"].is_array());
    }

    #[test]
    fn test_overflowing_area_names_the_row() {
        let mut big = row("b.jpg", [0, 0, 0, 0], "cat");
        big.width = Number::from_f64(1e200).unwrap();
        big.height = Number::from_f64(1e200).unwrap();
        let rows = vec![row("a.jpg", [0, 0, 1, 1], "cat"), big];

        let err = convert_rows(&rows, &["cat"], None).unwrap_err();
        assert!(matches!(err, CocofyError::AreaOverflow { row: 2, .. }));
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("not representable"));
    }

    #[test]
    fn test_float_area_is_exact_product() {
        let mut r = row("a.jpg", [0, 0, 0, 0], "cat");
        r.width = Number::from_f64(2.5).unwrap();
        r.height = Number::from_f64(0.1).unwrap();
        let conversion = convert_rows(&[r], &["cat"], None).unwrap();
        assert_eq!(
            conversion.document.annotations[0].area.as_f64(),
            Some(2.5 * 0.1)
        );
    }

    #[test]
    fn test_records_with_missing_field_fail_before_conversion() {
        let good = json!({
            "filename": "a.jpg", "x": 1, "y": 2, "width": 3, "height": 4,
            "image_width": 100, "image_height": 200,
            "label": "cat", "iscrowd": 0, "ignore": 0
        });
        let mut bad = good.as_object().cloned().unwrap();
        bad.remove("iscrowd");
        // an ignored row still has to be well-formed
        bad.insert("ignore".to_string(), json!(1));

        let records = vec![good.as_object().cloned().unwrap(), bad];
        let err = convert(&records, &["cat"], None).unwrap_err();
        assert!(matches!(
            err,
            CocofyError::MissingField {
                row: 2,
                field: "iscrowd"
            }
        ));
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let rows = vec![
            row("b.jpg", [1, 2, 3, 4], "cat"),
            row("a.jpg", [5, 6, 7, 8], "dog"),
            row("b.jpg", [9, 9, 9, 9], "bird"),
        ];
        let categories = ["dog", "cat"];
        let first = convert_rows(&rows, &categories, None).unwrap();
        let second = convert_rows(&rows, &categories, None).unwrap();
        assert_eq!(
            to_annotation_string(&first.document).unwrap(),
            to_annotation_string(&second.document).unwrap()
        );
    }

    #[test]
    fn test_summarize_truncates() {
        let names: Vec<String> = (0..8).map(|i| i.to_string()).collect();
        assert_eq!(summarize(&names), "0, 1, 2, 3, 4 and 3 more");
        assert_eq!(summarize(&names[..2]), "0, 1");
    }
}
