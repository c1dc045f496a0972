//! PDF loading.
//!
//! Documents are read with `tokio::fs` and parsed with lopdf. Every load
//! reads the file from scratch; nothing is cached between loads.
//!
//! # Examples
//!
//! ```no_run
//! use pdftoolkit::io::reader::PdfReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> pdftoolkit::Result<()> {
//! let reader = PdfReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (results, stats) = reader.load_all(&paths, 4).await;
//! println!("{} page(s) in {} file(s)", stats.total_pages, stats.success_count);
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt};
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Result, ToolkitError};
use crate::io::writer::format_file_size;

/// A parsed PDF with load metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to read and parse the file.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// Result of a load operation (success or failure).
pub type LoadResult = Result<LoadedPdf>;

/// Aggregate numbers for a batch load.
#[derive(Debug, Clone)]
pub struct LoadStatistics {
    /// Number of PDFs successfully loaded.
    pub success_count: usize,

    /// Number of PDFs that failed to load.
    pub failure_count: usize,

    /// Wall-clock time for the batch.
    pub total_time: Duration,

    /// Total size of successfully loaded files.
    pub total_size: u64,

    /// Total number of pages loaded.
    pub total_pages: usize,
}

impl LoadStatistics {
    fn from_results(results: &[LoadResult], total_time: Duration) -> Self {
        let loaded = results.iter().filter_map(|result| result.as_ref().ok());

        let (success_count, total_size, total_pages) = loaded.fold((0, 0, 0), |acc, pdf| {
            (acc.0 + 1, acc.1 + pdf.file_size, acc.2 + pdf.page_count)
        });

        Self {
            success_count,
            failure_count: results.len() - success_count,
            total_time,
            total_size,
            total_pages,
        }
    }

    /// Total size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Loads PDFs, optionally insisting that they have pages.
#[derive(Debug, Clone)]
pub struct PdfReader {
    require_pages: bool,
}

impl PdfReader {
    /// Reader that rejects documents without pages.
    pub fn new() -> Self {
        Self {
            require_pages: true,
        }
    }

    /// Reader that accepts documents without pages.
    pub fn allowing_empty() -> Self {
        Self {
            require_pages: false,
        }
    }

    /// Load one PDF.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the file does not exist or cannot be read
    /// - it does not parse as a PDF
    /// - it is encrypted
    /// - it has no pages (unless built with [`allowing_empty`](Self::allowing_empty))
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let start = Instant::now();

        let bytes = tokio::fs::read(path).await.map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ToolkitError::file_not_found(path.to_path_buf()),
            _ => ToolkitError::FileNotAccessible {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let loaded = self.parse(path, &bytes, start)?;
        debug!(
            path = %path.display(),
            pages = loaded.page_count,
            elapsed = ?loaded.load_time,
            "loaded PDF"
        );
        Ok(loaded)
    }

    /// Load one PDF without a runtime.
    pub fn load_blocking(&self, path: &Path) -> Result<LoadedPdf> {
        let start = Instant::now();
        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ToolkitError::file_not_found(path.to_path_buf()),
            _ => ToolkitError::FileNotAccessible {
                path: path.to_path_buf(),
                source,
            },
        })?;
        self.parse(path, &bytes, start)
    }

    fn parse(&self, path: &Path, bytes: &[u8], start: Instant) -> Result<LoadedPdf> {
        let document = Document::load_mem(bytes).map_err(|e| {
            let message = e.to_string();
            let lower = message.to_lowercase();
            if lower.contains("encrypt") || lower.contains("password") {
                ToolkitError::encrypted_pdf(path.to_path_buf())
            } else {
                ToolkitError::failed_to_load_pdf(path.to_path_buf(), message)
            }
        })?;

        if document.is_encrypted() {
            return Err(ToolkitError::encrypted_pdf(path.to_path_buf()));
        }

        let page_count = document.get_pages().len();
        if self.require_pages && page_count == 0 {
            return Err(ToolkitError::corrupted_pdf(
                path.to_path_buf(),
                "PDF has no pages",
            ));
        }

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            load_time: start.elapsed(),
            file_size: bytes.len() as u64,
        })
    }

    /// Load several PDFs with at most `workers` loads in flight.
    ///
    /// Results are returned in input order, together with batch statistics.
    pub async fn load_all(
        &self,
        paths: &[PathBuf],
        workers: usize,
    ) -> (Vec<LoadResult>, LoadStatistics) {
        let start = Instant::now();

        let results: Vec<LoadResult> = stream::iter(paths)
            .map(|path| self.load(path))
            .buffered(workers.max(1))
            .collect()
            .await;

        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
