//! The ordered list of sources to combine.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::MIN_COMBINE_SOURCES;
use crate::error::{Result, ToolkitError};
use crate::io::SourceFile;

/// Ordered, duplicate-free list of source paths.
///
/// The order of the list is the page order of the combined output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineList {
    paths: Vec<PathBuf>,
}

impl CombineList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already listed. Returns whether it was added.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            debug!(path = %path.display(), "already in combine list");
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Append several paths, skipping duplicates. Returns how many were added.
    pub fn add_all<I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            if self.add(path) {
                added += 1;
            }
        }
        added
    }

    /// Remove the entries at `indices`. Out-of-range indices are ignored.
    pub fn remove_selected(&mut self, indices: &[usize]) {
        let mut index = 0;
        self.paths.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
    }

    /// Move the entry at `index` one place towards the front.
    ///
    /// Returns `false` if it is already first or out of range.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.paths.len() {
            return false;
        }
        self.paths.swap(index - 1, index);
        true
    }

    /// Move the entry at `index` one place towards the back.
    ///
    /// Returns `false` if it is already last or out of range.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.paths.len() {
            return false;
        }
        self.paths.swap(index, index + 1);
        true
    }

    /// Reverse the whole list.
    pub fn reverse(&mut self) {
        self.paths.reverse();
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Whether `path` is listed.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// The listed paths, in output order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Check that there is enough to combine.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotEnoughSources`] with fewer than
    /// [`MIN_COMBINE_SOURCES`] entries.
    pub fn ensure_combinable(&self) -> Result<()> {
        if self.paths.len() < MIN_COMBINE_SOURCES {
            return Err(ToolkitError::NotEnoughSources {
                required: MIN_COMBINE_SOURCES,
                found: self.paths.len(),
            });
        }
        Ok(())
    }

    /// Classify every entry, in order.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is missing or of an unsupported kind.
    pub fn sources(&self) -> Result<Vec<SourceFile>> {
        self.paths.iter().map(|path| SourceFile::detect(path.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> CombineList {
        let mut list = CombineList::new();
        list.add_all(names.iter().copied());
        list
    }

    fn names(list: &CombineList) -> Vec<String> {
        list.paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut list = list(&["a.pdf", "b.png"]);
        assert!(!list.add("a.pdf"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.add_all(["b.png", "c.pdf", "c.pdf"]), 1);
        assert_eq!(names(&list), ["a.pdf", "b.png", "c.pdf"]);
    }

    #[test]
    fn test_moves() {
        let mut list = list(&["a", "b", "c"]);

        assert!(list.move_up(2));
        assert_eq!(names(&list), ["a", "c", "b"]);
        assert!(!list.move_up(0));

        assert!(list.move_down(0));
        assert_eq!(names(&list), ["c", "a", "b"]);
        assert!(!list.move_down(2));
        assert!(!list.move_down(7));
    }

    #[test]
    fn test_reverse_and_remove() {
        let mut list = list(&["a", "b", "c", "d"]);
        list.reverse();
        assert_eq!(names(&list), ["d", "c", "b", "a"]);

        list.remove_selected(&[0, 2, 9]);
        assert_eq!(names(&list), ["c", "a"]);
    }

    #[test]
    fn test_reorder_keeps_members() {
        let mut list = list(&["a", "b", "c"]);
        let mut before = list.paths().to_vec();
        list.move_down(0);
        list.reverse();
        let mut after = list.paths().to_vec();

        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_ensure_combinable() {
        let err = list(&["a.pdf"]).ensure_combinable().unwrap_err();
        assert!(matches!(
            err,
            ToolkitError::NotEnoughSources {
                required: 2,
                found: 1
            }
        ));
        assert!(list(&["a.pdf", "b.pdf"]).ensure_combinable().is_ok());
    }
}
