//! Pages marked for removal from the split source.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The split source and the 1-based pages marked for removal.
///
/// Page numbers always refer to the source's original numbering; choosing a
/// different source starts a fresh selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSelection {
    source: Option<PathBuf>,
    page_count: usize,
    marked: BTreeSet<u32>,
    anchor: Option<u32>,
}

impl SplitSelection {
    /// No source, nothing marked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the document to remove pages from.
    pub fn select_source(&mut self, path: impl Into<PathBuf>, page_count: usize) {
        self.source = Some(path.into());
        self.page_count = page_count;
        self.clear();
    }

    /// Flip one page. Returns whether it is now marked.
    ///
    /// Pages outside `1..=page_count` are ignored.
    pub fn toggle(&mut self, page: u32) -> bool {
        if !self.in_range(page) {
            return false;
        }

        self.anchor = Some(page);
        if self.marked.remove(&page) {
            false
        } else {
            self.marked.insert(page);
            true
        }
    }

    /// Mark every page between `from` and `to`, inclusive, in either order.
    pub fn select_range(&mut self, from: u32, to: u32) {
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        let high = high.min(self.page_count_u32());
        self.marked.extend(low.max(1)..=high);
        self.anchor = Some(to);
    }

    /// Shift-click: mark from the last clicked page to `page`.
    pub fn extend_to(&mut self, page: u32) {
        let from = self.anchor.unwrap_or(page);
        self.select_range(from, page);
    }

    /// Unmark everything.
    pub fn clear(&mut self) {
        self.marked.clear();
        self.anchor = None;
    }

    /// Marked pages, or `None` when nothing is marked.
    pub fn exclusions(&self) -> Option<&BTreeSet<u32>> {
        (!self.marked.is_empty()).then_some(&self.marked)
    }

    /// Whether `page` is marked.
    pub fn is_marked(&self, page: u32) -> bool {
        self.marked.contains(&page)
    }

    /// Current source, if one was chosen.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Page count of the current source.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages that would remain after removal.
    pub fn remaining(&self) -> usize {
        self.page_count - self.marked.len()
    }

    fn in_range(&self, page: u32) -> bool {
        page >= 1 && (page as usize) <= self.page_count
    }

    fn page_count_u32(&self) -> u32 {
        u32::try_from(self.page_count).unwrap_or(u32::MAX)
    }
}
