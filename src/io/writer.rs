//! PDF saving.
//!
//! Saves are atomic: the document is compressed, written to a temporary file
//! next to the target and renamed into place once complete. The `.pdf`
//! extension is enforced on every output path.

use lopdf::Document;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ToolkitError};

/// Result of a write.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

/// Writes PDF documents to disk.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter;

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Save `doc` to `path` on the current thread.
    ///
    /// `path` gets `.pdf` appended if it lacks that extension; the returned
    /// statistics carry the path actually written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, written or renamed.
    pub fn save_blocking(&self, doc: &mut Document, path: &Path) -> Result<WriteStatistics> {
        let output_path = ensure_pdf_extension(path);
        let write_path = temp_path_for(&output_path);

        doc.compress();

        let file = std::fs::File::create(&write_path).map_err(|source| {
            ToolkitError::FailedToCreateOutput {
                path: write_path.clone(),
                source,
            }
        })?;

        let mut writer = std::io::BufWriter::new(file);
        doc.save_to(&mut writer)
            .map_err(|e| ToolkitError::FailedToWrite {
                path: write_path.clone(),
                source: std::io::Error::other(e),
            })?;
        writer.flush().map_err(|source| ToolkitError::FailedToWrite {
            path: write_path.clone(),
            source,
        })?;
        drop(writer);

        std::fs::rename(&write_path, &output_path).map_err(|source| {
            ToolkitError::FailedToWrite {
                path: output_path.clone(),
                source,
            }
        })?;

        let file_size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
        debug!(path = %output_path.display(), bytes = file_size, "saved PDF");

        Ok(WriteStatistics {
            file_size,
            output_path,
        })
    }
}

/// Append `.pdf` unless the path already ends in it (case-insensitive).
///
/// ```
/// use pdftoolkit::io::writer::ensure_pdf_extension;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(ensure_pdf_extension(Path::new("out")), PathBuf::from("out.pdf"));
/// assert_eq!(ensure_pdf_extension(Path::new("out.PDF")), PathBuf::from("out.PDF"));
/// assert_eq!(ensure_pdf_extension(Path::new("scan.png")), PathBuf::from("scan.png.pdf"));
/// ```
pub fn ensure_pdf_extension(path: &Path) -> PathBuf {
    let has_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if has_pdf {
        path.to_path_buf()
    } else {
        let mut name = OsString::from(path.as_os_str());
        name.push(".pdf");
        PathBuf::from(name)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
