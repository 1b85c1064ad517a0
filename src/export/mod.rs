//! Writing a conversion to disk.
//!
//! Output layout:
//!
//! ```text
//! <destination>/
//! ├── annotations.json
//! └── images/
//!     └── <base name of every referenced file>
//! ```
//!
//! Image copies are independent. A missing or unreadable source image is
//! recorded in the [`ExportReport`] and the remaining copies still run; the
//! annotation file is already complete at that point and stays valid.
//!
//! Copies keep the source file's permissions and modification time. A
//! source that is the very file a copy would overwrite (for example when the
//! image folder is `<destination>/images`) is reported as a failure and left
//! untouched.

mod report;

pub use report::{CopyFailure, DimensionMismatch, ExportReport};

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coco::io_json::write_annotation_json;
use crate::coco::ImageRecord;
use crate::conversion::Conversion;
use crate::error::CocofyError;

/// Where and how to write a conversion.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Root of the output tree.
    pub destination: PathBuf,
    /// Folder holding the source images. Required when `copy_images` is set.
    pub image_folder: Option<PathBuf>,
    pub copy_images: bool,
    /// File name of the annotation document inside `destination`.
    pub annotations_file: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("cocofy"),
            image_folder: None,
            copy_images: true,
            annotations_file: "annotations.json".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn with_image_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.image_folder = Some(folder.into());
        self
    }

    pub fn without_images(mut self) -> Self {
        self.copy_images = false;
        self
    }

    pub fn annotations_path(&self) -> PathBuf {
        self.destination.join(&self.annotations_file)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.destination.join("images")
    }
}

/// Writes the annotation document and copies the referenced images.
///
/// # Errors
/// Fails before touching the filesystem with
/// [`CocofyError::MissingImageFolder`] if copying is enabled without an image
/// folder. Fails with an I/O or write error if the output directories or the
/// annotation file cannot be written. Individual image copy failures are not
/// errors; they are returned in [`ExportReport::failures`].
pub fn export(conversion: &Conversion, options: &ExportOptions) -> Result<ExportReport, CocofyError> {
    let image_folder = match (options.copy_images, options.image_folder.as_deref()) {
        (true, None) => return Err(CocofyError::MissingImageFolder),
        (true, Some(folder)) => Some(folder),
        (false, _) => None,
    };

    let images_dir = options.images_dir();
    fs::create_dir_all(&images_dir).map_err(CocofyError::Io)?;

    let annotations_path = options.annotations_path();
    write_annotation_json(&annotations_path, &conversion.document)?;
    log::info!("wrote {}", annotations_path.display());

    let mut report = ExportReport {
        annotations_path,
        images_dir,
        ..Default::default()
    };

    if let Some(folder) = image_folder {
        copy_images(conversion, folder, &mut report);
        log::info!(
            "copied {} of {} image(s) into {}",
            report.copied,
            report.attempted,
            report.images_dir.display()
        );
    }

    Ok(report)
}

fn copy_images(conversion: &Conversion, folder: &Path, report: &mut ExportReport) {
    let declared: HashMap<&str, &ImageRecord> = conversion
        .document
        .images
        .iter()
        .map(|img| (img.file_name.as_str(), img))
        .collect();
    let mut base_names: HashMap<OsString, &str> = HashMap::new();

    for file_name in &conversion.image_files {
        report.attempted += 1;

        let Some(base) = Path::new(file_name).file_name() else {
            fail(report, file_name, None, "file name has no base name".to_string());
            continue;
        };
        let source = folder.join(base);

        if let Some(earlier) = base_names.get(base) {
            let reason = format!("base name collides with '{earlier}'");
            fail(report, file_name, Some(source), reason);
            continue;
        }
        if !source.is_file() {
            fail(report, file_name, Some(source), "source image not found".to_string());
            continue;
        }

        let target = report.images_dir.join(base);
        if same_file(&source, &target) {
            let reason = "source and destination are the same file".to_string();
            fail(report, file_name, Some(source), reason);
            continue;
        }
        if let Err(e) = fs::copy(&source, &target) {
            fail(report, file_name, Some(source), e.to_string());
            continue;
        }
        keep_modified_time(&source, &target);

        log::debug!("copied {} -> {}", source.display(), target.display());
        base_names.insert(base.to_os_string(), file_name.as_str());
        report.copied += 1;

        if let Some(image) = declared.get(file_name.as_str()) {
            check_dimensions(image, &target, report);
        }
    }
}

/// `fs::copy` truncates the target before reading the source, so copying a
/// file onto itself empties it.
fn same_file(source: &Path, target: &Path) -> bool {
    if !target.exists() {
        return false;
    }
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn keep_modified_time(source: &Path, target: &Path) {
    let result = fs::metadata(source)
        .and_then(|meta| meta.modified())
        .and_then(|modified| {
            fs::File::options()
                .write(true)
                .open(target)?
                .set_modified(modified)
        });
    if let Err(e) = result {
        log::debug!("cannot keep modification time of {}: {}", target.display(), e);
    }
}

fn fail(report: &mut ExportReport, file_name: &str, source: Option<PathBuf>, reason: String) {
    log::warn!("could not copy '{}': {}", file_name, reason);
    report.failures.push(CopyFailure {
        file_name: file_name.to_string(),
        source,
        reason,
    });
}

/// Compares the table's dimensions with the copied file's header.
/// Formats `imagesize` cannot read are skipped.
fn check_dimensions(image: &ImageRecord, path: &Path, report: &mut ExportReport) {
    let size = match imagesize::size(path) {
        Ok(size) => size,
        Err(e) => {
            log::debug!("cannot read size of {}: {}", path.display(), e);
            return;
        }
    };

    let matches = image.width.as_f64() == Some(size.width as f64)
        && image.height.as_f64() == Some(size.height as f64);
    if !matches {
        let mismatch = DimensionMismatch {
            file_name: image.file_name.clone(),
            declared_width: image.width.clone(),
            declared_height: image.height.clone(),
            actual_width: size.width,
            actual_height: size.height,
        };
        log::warn!("{}", mismatch);
        report.dimension_mismatches.push(mismatch);
    }
}
