//! Page removal.
//!
//! Produces a copy of a PDF without the selected pages. Remaining pages keep
//! their original order and content; only the page tree is rebuilt, and
//! objects nothing refers to any more are pruned.

use lopdf::{Document, ObjectId};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PageSelection;
use crate::error::{Result, ToolkitError};
use crate::io::reader::PdfReader;
use crate::io::writer::PdfWriter;
use crate::utils::{flatten_inherited_attributes, set_page_tree};

/// Outcome of a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    /// Path actually written (with `.pdf` enforced).
    pub output: PathBuf,

    /// Pages in the source.
    pub original_pages: usize,

    /// 1-based source page numbers kept, in order.
    pub kept: Vec<u32>,
}

impl RemovalReport {
    /// Number of pages removed.
    pub fn removed(&self) -> usize {
        self.original_pages - self.kept.len()
    }
}

/// Removes pages from PDFs.
#[derive(Debug, Clone, Default)]
pub struct PageRemover {
    reader: PdfReader,
    writer: PdfWriter,
    allow_empty: bool,
}

impl PageRemover {
    /// Remover that refuses to remove every page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether removing every page is allowed (writes an empty page tree).
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Write `source` minus `exclusions` to `output`.
    ///
    /// `None` means no selection was made and is refused; an empty set
    /// writes an unchanged copy.
    ///
    /// # Errors
    ///
    /// - [`ToolkitError::NoPageSelection`] when `exclusions` is `None`
    /// - [`ToolkitError::InvalidPageSelection`] for page numbers outside the document
    /// - [`ToolkitError::WouldRemoveAllPages`] when nothing would remain and
    ///   empty output is not allowed
    /// - load and write errors
    pub fn remove(
        &self,
        source: &Path,
        exclusions: Option<&BTreeSet<u32>>,
        output: &Path,
    ) -> Result<RemovalReport> {
        let exclusions = exclusions.ok_or(ToolkitError::NoPageSelection)?;
        let doc = self.reader.load_blocking(source)?.document;
        self.remove_loaded(source, doc, exclusions, output)
    }

    fn remove_loaded(
        &self,
        source: &Path,
        mut doc: Document,
        exclusions: &BTreeSet<u32>,
        output: &Path,
    ) -> Result<RemovalReport> {
        let original_pages = doc.get_pages().len();
        let kept = self.remove_from_document(&mut doc, source, exclusions)?;
        let stats = self.writer.save_blocking(&mut doc, output)?;

        info!(
            source = %source.display(),
            output = %stats.output_path.display(),
            removed = original_pages - kept.len(),
            kept = kept.len(),
            "removed pages"
        );

        Ok(RemovalReport {
            output: stats.output_path,
            original_pages,
            kept,
        })
    }

    /// Write `source` minus the pages in `selection` to `output`.
    ///
    /// The selection is checked against the page count before it is expanded,
    /// so a range such as `1-4294967295` fails fast on a short document.
    ///
    /// # Errors
    ///
    /// Same as [`remove`](Self::remove).
    pub fn remove_selection(
        &self,
        source: &Path,
        selection: Option<&PageSelection>,
        output: &Path,
    ) -> Result<RemovalReport> {
        let selection = selection.ok_or(ToolkitError::NoPageSelection)?;
        let doc = self.reader.load_blocking(source)?.document;

        let total_pages = doc.get_pages().len();
        let exclusions =
            selection
                .within(total_pages)
                .ok_or_else(|| ToolkitError::InvalidPageSelection {
                    path: source.to_path_buf(),
                    selection: selection.to_string(),
                    total_pages,
                })?;

        self.remove_loaded(source, doc, &exclusions, output)
    }

    /// Drop `exclusions` from `doc` in place. Returns the kept page numbers.
    pub fn remove_from_document(
        &self,
        doc: &mut Document,
        source: &Path,
        exclusions: &BTreeSet<u32>,
    ) -> Result<Vec<u32>> {
        let pages = doc.get_pages();
        let total_pages = pages.len();

        let out_of_range = exclusions
            .iter()
            .any(|&page| page == 0 || page as usize > total_pages);
        if out_of_range {
            return Err(ToolkitError::InvalidPageSelection {
                path: source.to_path_buf(),
                selection: PageSelection::from_pages(exclusions.iter().copied()).to_string(),
                total_pages,
            });
        }

        let (kept, kept_ids): (Vec<u32>, Vec<ObjectId>) = pages
            .into_iter()
            .filter(|(number, _)| !exclusions.contains(number))
            .unzip();

        if kept.is_empty() && total_pages > 0 && !self.allow_empty {
            return Err(ToolkitError::WouldRemoveAllPages {
                path: source.to_path_buf(),
                total_pages,
            });
        }

        for &page_id in &kept_ids {
            flatten_inherited_attributes(doc, page_id)?;
        }
        set_page_tree(doc, &kept_ids)?;
        doc.prune_objects();
        doc.renumber_objects();

        Ok(kept)
    }
}
