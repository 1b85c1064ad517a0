//! Conversion report types.
//!
//! A report records what the conversion kept and what it left out, so a
//! caller can tell "no annotations because nothing matched the vocabulary"
//! apart from "no annotations because the table was empty".

use serde::Serialize;
use std::fmt;

/// Summary of one table-to-COCO conversion.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    pub counts: ConversionCounts,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Count of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Returns true if any issue with the given code was recorded.
    pub fn has(&self, code: ConversionIssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "  {} rows ({} ignored) -> {} images, {} categories, {} annotations",
            c.rows, c.ignored_rows, c.images, c.categories, c.annotations
        )?;

        for (severity, title) in [
            (ConversionSeverity::Warning, "Warnings"),
            (ConversionSeverity::Info, "Notes"),
        ] {
            let matching: Vec<&ConversionIssue> = self
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if matching.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, matching.len())?;
            for issue in matching {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Row and record counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    /// Rows in the input table.
    pub rows: usize,
    /// Rows dropped by the ignore flag.
    pub ignored_rows: usize,
    pub images: usize,
    pub categories: usize,
    pub annotations: usize,
}

/// A single observation about the conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (the output may not be what was meant).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (expected filtering, for the record).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// Fails the run under `--strict`.
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// Rows were excluded by a non-zero ignore flag.
    IgnoredRows,
    /// Rows were dropped from annotations because their label is not in the vocabulary.
    UnlistedLabels,
    /// Vocabulary entries that no annotation uses.
    UnusedCategories,
    /// Images that appear only through rows with unlisted labels.
    ImagesWithoutAnnotations,
    /// A file name was seen with different image dimensions; the first were kept.
    ConflictingImageDimensions,
    /// The vocabulary is empty, so no annotations can be produced.
    EmptyVocabulary,
}
