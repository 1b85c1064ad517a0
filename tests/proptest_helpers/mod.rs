#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashSet};

use cocofy::coco::{AnnotationDocument, CategoryId, ImageId};
use cocofy::table::{ObservationRow, Record};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Labels rows are drawn from; vocabularies are drawn from the same pool
/// plus a few names that never occur in the data.
pub const LABELS: [&str; 5] = ["cat", "dog", "bird", "car", "tree"];
pub const EXTRA_CATEGORIES: [&str; 2] = ["boat", "horse"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A table where file names repeat often and a share of rows is ignored.
pub fn arb_rows(max_rows: usize) -> BoxedStrategy<Vec<ObservationRow>> {
    proptest::collection::vec(arb_row(), 0..=max_rows).boxed()
}

fn arb_row() -> impl Strategy<Value = ObservationRow> {
    (
        0usize..6,
        (0i64..500, 0i64..500, 0i64..300, 0i64..300),
        (1i64..4096, 1i64..4096),
        0usize..LABELS.len(),
        0i64..=1,
        prop_oneof![4 => Just(0i64), 1 => Just(1i64)],
    )
        .prop_map(|(file, (x, y, w, h), size, label, iscrowd, ignore)| {
            ObservationRow::new(
                format!("img_{file}.jpg"),
                [x, y, w, h],
                size,
                LABELS[label],
                iscrowd,
                ignore,
            )
        })
}

/// An ordered, duplicate-free vocabulary (possibly empty).
pub fn arb_vocabulary() -> BoxedStrategy<Vec<String>> {
    let pool: Vec<&'static str> = LABELS.iter().chain(EXTRA_CATEGORIES.iter()).copied().collect();
    proptest::sample::subsequence(pool.clone(), 0..=pool.len())
        .prop_shuffle()
        .prop_map(|names| names.into_iter().map(str::to_string).collect())
        .boxed()
}

/// Converts typed rows back into loosely typed records, as a loader would
/// produce them from a JSON table.
pub fn to_records(rows: &[ObservationRow]) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            let value = serde_json::json!({
                "filename": row.filename,
                "x": row.x,
                "y": row.y,
                "width": row.width,
                "height": row.height,
                "image_width": row.image_width,
                "image_height": row.image_height,
                "label": row.label,
                "iscrowd": row.iscrowd,
                "ignore": row.ignore,
            });
            match value {
                serde_json::Value::Object(record) => record,
                _ => unreachable!("json! object literal"),
            }
        })
        .collect()
}

pub fn assert_valid_references(document: &AnnotationDocument) -> Result<(), String> {
    let image_ids: Vec<ImageId> = document.images.iter().map(|img| img.id).collect();
    let category_ids: Vec<CategoryId> = document.categories.iter().map(|cat| cat.id).collect();

    for ann in &document.annotations {
        let image_hits = image_ids.iter().filter(|id| **id == ann.image_id).count();
        if image_hits != 1 {
            return Err(format!(
                "annotation {} matches {} image(s) with id {}",
                ann.id, image_hits, ann.image_id
            ));
        }
        let category_hits = category_ids
            .iter()
            .filter(|id| **id == ann.category_id)
            .count();
        if category_hits != 1 {
            return Err(format!(
                "annotation {} matches {} category(ies) with id {}",
                ann.id, category_hits, ann.category_id
            ));
        }
    }

    Ok(())
}

/// Checks that `ids` is exactly `0, 1, ..., n-1` in order.
pub fn assert_dense(ids: impl IntoIterator<Item = u64>, what: &str) -> Result<(), String> {
    for (expected, id) in ids.into_iter().enumerate() {
        if id != expected as u64 {
            return Err(format!("{what} id at position {expected} is {id}"));
        }
    }
    Ok(())
}

/// Distinct file names of kept rows in first-seen order.
pub fn expected_image_files(rows: &[ObservationRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| row.ignore == 0)
        .filter(|row| seen.insert(row.filename.clone()))
        .map(|row| row.filename.clone())
        .collect()
}

/// (file name, label) of every row that should become an annotation, in order.
pub fn expected_annotations(rows: &[ObservationRow], vocabulary: &[String]) -> Vec<(String, String)> {
    let vocabulary: BTreeSet<&str> = vocabulary.iter().map(String::as_str).collect();
    rows.iter()
        .filter(|row| row.ignore == 0 && vocabulary.contains(row.label.as_str()))
        .map(|row| (row.filename.clone(), row.label.clone()))
        .collect()
}

/// (file name, label) of every annotation in a document, resolved through ids.
pub fn resolved_annotations(document: &AnnotationDocument) -> Result<Vec<(String, String)>, String> {
    let files: BTreeMap<ImageId, &str> = document
        .images
        .iter()
        .map(|img| (img.id, img.file_name.as_str()))
        .collect();
    let names: BTreeMap<CategoryId, &str> = document
        .categories
        .iter()
        .map(|cat| (cat.id, cat.name.as_str()))
        .collect();

    document
        .annotations
        .iter()
        .map(|ann| {
            let file = files
                .get(&ann.image_id)
                .ok_or_else(|| format!("missing image {}", ann.image_id))?;
            let name = names
                .get(&ann.category_id)
                .ok_or_else(|| format!("missing category {}", ann.category_id))?;
            Ok((file.to_string(), name.to_string()))
        })
        .collect()
}
