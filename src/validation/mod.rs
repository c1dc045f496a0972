//! Input validation for pdftoolkit.
//!
//! Every source is checked before an operation touches it:
//! - File existence and accessibility
//! - Kind detection (PDF or raster image)
//! - Encryption detection
//! - Page count and first-page dimensions
//!
//! Output paths are checked separately with [`Validator::validate_output`].
//!
//! # Examples
//!
//! ```no_run
//! use pdftoolkit::validation::Validator;
//! use std::path::PathBuf;
//!
//! # async fn example() -> pdftoolkit::Result<()> {
//! let validator = Validator::new();
//! let result = validator.validate_file(&PathBuf::from("scan.png")).await?;
//! println!("{} contributes {} page(s)", result.path.display(), result.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::{Document, Object};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::OverwriteMode;
use crate::error::{Result, ToolkitError};
use crate::io::reader::PdfReader;
use crate::io::writer::format_file_size;
use crate::io::{SourceFile, SourceKind};

/// Result of validating a single source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Path to the validated file.
    pub path: PathBuf,

    /// Detected kind.
    pub kind: SourceKind,

    /// Pages the source contributes (1 for images).
    pub page_count: usize,

    /// PDF version, for PDFs.
    pub version: Option<String>,

    /// Size of the file in bytes.
    pub file_size: u64,

    /// Number of objects, for PDFs.
    pub object_count: Option<usize>,

    /// First page size: points for PDFs, pixels for images.
    pub page_dimensions: Option<(f32, f32)>,
}

impl ValidationResult {
    fn from_document(path: PathBuf, doc: &Document, file_size: u64) -> Self {
        let pages = doc.get_pages();

        let page_dimensions = pages
            .values()
            .next()
            .and_then(|&page_id| doc.get_dictionary(page_id).ok())
            .and_then(|page| page.get(b"MediaBox").ok())
            .and_then(|media_box| match media_box {
                Object::Array(values) if values.len() >= 4 => {
                    let width = values[2].as_float().ok()? - values[0].as_float().ok()?;
                    let height = values[3].as_float().ok()? - values[1].as_float().ok()?;
                    Some((width, height))
                }
                _ => None,
            });

        Self {
            path,
            kind: SourceKind::Pdf,
            page_count: pages.len(),
            version: Some(doc.version.clone()),
            file_size,
            object_count: Some(doc.objects.len()),
            page_dimensions,
        }
    }
}

/// Summary of validation results for multiple files.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Individual validation results for each file.
    pub results: Vec<ValidationResult>,

    /// Total number of pages across all files.
    pub total_pages: usize,

    /// Total file size in bytes.
    pub total_size: u64,

    /// Number of files that passed validation.
    pub files_validated: usize,

    /// Number of files that failed validation.
    pub files_failed: usize,
}

impl ValidationSummary {
    /// Create a summary from validation results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let total_pages = results.iter().map(|r| r.page_count).sum();
        let total_size = results.iter().map(|r| r.file_size).sum();
        let files_validated = results.len();

        Self {
            results,
            total_pages,
            total_size,
            files_validated,
            files_failed: 0,
        }
    }

    /// Format the total file size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Validator for sources and output paths.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    reader: PdfReader,
}

impl Validator {
    /// Validator that rejects PDFs without pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator that accepts PDFs without pages, as page removal with
    /// `--allow-empty` can produce them.
    pub fn allowing_empty() -> Self {
        Self {
            reader: PdfReader::allowing_empty(),
        }
    }

    /// Validate a single source.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File does not exist, is not a file, or is empty
    /// - File is neither a PDF nor a supported image
    /// - The PDF is encrypted or cannot be parsed
    /// - The image header cannot be decoded
    pub async fn validate_file(&self, path: &Path) -> Result<ValidationResult> {
        if !path.exists() {
            return Err(ToolkitError::file_not_found(path.to_path_buf()));
        }

        if !path.is_file() {
            return Err(ToolkitError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| ToolkitError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: e,
                })?;

        if metadata.len() == 0 {
            return Err(ToolkitError::corrupted_pdf(path.to_path_buf(), "File is empty"));
        }

        let source = SourceFile::detect(path)?;
        match source.kind {
            SourceKind::Pdf => {
                let loaded = self.reader.load(path).await?;
                Ok(ValidationResult::from_document(
                    loaded.path,
                    &loaded.document,
                    loaded.file_size,
                ))
            }
            SourceKind::Image(_) => {
                let (width, height) = image::image_dimensions(path).map_err(|e| {
                    ToolkitError::failed_to_load_image(path.to_path_buf(), e.to_string())
                })?;
                Ok(ValidationResult {
                    path: path.to_path_buf(),
                    kind: source.kind,
                    page_count: 1,
                    version: None,
                    file_size: metadata.len(),
                    object_count: None,
                    page_dimensions: Some((width as f32, height as f32)),
                })
            }
        }
    }

    /// Validate multiple sources.
    ///
    /// # Errors
    ///
    /// Returns the first failure unless `continue_on_error` is set, and
    /// [`ToolkitError::NotEnoughSources`] when nothing passed.
    pub async fn validate_files(
        &self,
        paths: &[PathBuf],
        continue_on_error: bool,
    ) -> Result<ValidationSummary> {
        let mut results = Vec::new();
        let mut failed_count = 0;

        for path in paths {
            match self.validate_file(path).await {
                Ok(result) => results.push(result),
                Err(e) if continue_on_error => {
                    warn!(path = %path.display(), error = %e, "skipping source");
                    failed_count += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if results.is_empty() {
            return Err(ToolkitError::NotEnoughSources {
                required: 1,
                found: 0,
            });
        }

        let mut summary = ValidationSummary::from_results(results);
        summary.files_failed = failed_count;

        Ok(summary)
    }

    /// Validate an output path against the inputs it is produced from.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output file exists and `overwrite_mode` is `NoClobber`
    /// - Output is one of the inputs
    /// - Output directory doesn't exist or is read-only
    pub async fn validate_output(
        &self,
        output: &Path,
        inputs: &[PathBuf],
        overwrite_mode: OverwriteMode,
    ) -> Result<()> {
        if output.exists() {
            if overwrite_mode == OverwriteMode::NoClobber {
                return Err(ToolkitError::output_exists(output.to_path_buf()));
            }

            let output_abs = output.canonicalize()?;
            let is_input = inputs
                .iter()
                .filter_map(|input| input.canonicalize().ok())
                .any(|input| input == output_abs);
            if is_input {
                return Err(ToolkitError::invalid_config(format!(
                    "Output file cannot be the same as an input file: {}",
                    output.display()
                )));
            }
        }

        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        if !parent.exists() {
            return Err(ToolkitError::invalid_config(format!(
                "Output directory does not exist: {}",
                parent.display()
            )));
        }

        let metadata =
            tokio::fs::metadata(parent)
                .await
                .map_err(|e| ToolkitError::FileNotAccessible {
                    path: parent.to_path_buf(),
                    source: e,
                })?;

        if metadata.permissions().readonly() {
            return Err(ToolkitError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }
}
