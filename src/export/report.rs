//! Export report types.

use serde::Serialize;
use serde_json::Number;
use std::fmt;
use std::path::PathBuf;

/// What an export wrote and which image copies went wrong.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExportReport {
    pub annotations_path: PathBuf,
    pub images_dir: PathBuf,
    /// Number of image copies attempted (0 when copying is disabled).
    pub attempted: usize,
    pub copied: usize,
    pub failures: Vec<CopyFailure>,
    pub dimension_mismatches: Vec<DimensionMismatch>,
}

impl ExportReport {
    /// Returns true if every attempted copy succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// File names that were not copied, in table order.
    pub fn failed_files(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.file_name.as_str())
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  annotations: {}", self.annotations_path.display())?;
        writeln!(
            f,
            "  images: {} of {} copied to {}",
            self.copied,
            self.attempted,
            self.images_dir.display()
        )?;

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Copy failures ({}):", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {}", failure)?;
            }
        }

        if !self.dimension_mismatches.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Dimension mismatches ({}):",
                self.dimension_mismatches.len()
            )?;
            for mismatch in &self.dimension_mismatches {
                writeln!(f, "  - {}", mismatch)?;
            }
        }

        Ok(())
    }
}

/// One image that could not be copied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CopyFailure {
    /// The file name as it appears in the table.
    pub file_name: String,
    /// The resolved source path, when one could be built.
    pub source: Option<PathBuf>,
    pub reason: String,
}

impl fmt::Display for CopyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(
                f,
                "'{}' ({}): {}",
                self.file_name,
                source.display(),
                self.reason
            ),
            None => write!(f, "'{}': {}", self.file_name, self.reason),
        }
    }
}

/// A copied image whose header disagrees with the table's dimensions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DimensionMismatch {
    pub file_name: String,
    pub declared_width: Number,
    pub declared_height: Number,
    pub actual_width: usize,
    pub actual_height: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': table says {}x{}, file is {}x{}",
            self.file_name,
            self.declared_width,
            self.declared_height,
            self.actual_width,
            self.actual_height
        )
    }
}
