//! Utilities for input expansion and page-tree surgery.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::PathBuf;

use crate::error::{Result, ToolkitError};

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree walked before assuming a cycle.
const MAX_TREE_DEPTH: usize = 64;

/// Expand shell-style patterns into filesystem paths, keeping input order.
///
/// A pattern without glob metacharacters that matches nothing is kept as a
/// literal path, so the caller reports it as missing rather than silently
/// dropping it.
///
/// # Errors
///
/// Propagates `glob` pattern and filesystem errors.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let mut matched = collect_paths_for_pattern(pattern)?;

        if matched.is_empty() && !has_glob_meta(pattern) {
            matched.push(PathBuf::from(pattern));
        }
        resolved_paths.extend(matched);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|err| ToolkitError::invalid_config(format!(
        "Invalid input pattern '{pattern}': {err}"
    )))?;

    paths
        .map(|entry| entry.map_err(|err| ToolkitError::other(err.to_string())))
        .collect()
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Object id of the document's root `Pages` node.
pub fn pages_root_id(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| ToolkitError::page_tree(format!("Failed to get pages reference: {e}")))
}

/// Replace the root page tree's children with `page_ids`, in order.
///
/// Every listed page is re-parented to the root. Intermediate nodes that
/// are no longer referenced are left for pruning.
pub fn set_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = pages_root_id(doc)?;

    for &page_id in page_ids {
        page_dictionary_mut(doc, page_id)?.set("Parent", Object::Reference(pages_id));
    }

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| ToolkitError::page_tree(format!("Failed to get pages object: {e}")))?;

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(page_ids.len() as i64));

    Ok(())
}

/// Copy every inheritable attribute a page gets from its ancestors onto the
/// page itself, so it keeps its appearance after being moved to a new parent.
pub fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| ToolkitError::page_tree(format!("Failed to get page {page_id:?}: {e}")))?;

    let mut missing: Vec<&[u8]> = INHERITABLE_PAGE_KEYS
        .into_iter()
        .filter(|key| !page.has(key))
        .collect();
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    let mut parent = parent_of(page);
    let mut depth = 0;

    while let Some(node_id) = parent {
        if missing.is_empty() {
            break;
        }
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(ToolkitError::page_tree(format!(
                "Page tree above {page_id:?} is deeper than {MAX_TREE_DEPTH} levels"
            )));
        }

        let node = doc.get_dictionary(node_id).map_err(|e| {
            ToolkitError::page_tree(format!("Failed to get page tree node {node_id:?}: {e}"))
        })?;

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = parent_of(node);
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = page_dictionary_mut(doc, page_id)?;
    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }

    Ok(())
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

fn page_dictionary_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| ToolkitError::page_tree(format!("Failed to get page {page_id:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use tempfile::TempDir;

    /// Root -> intermediate node (holds MediaBox and Rotate) -> one page.
    fn nested_document() -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let root_id = doc.new_object_id();
        let node_id = doc.new_object_id();

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => node_id,
        });
        doc.objects.insert(
            node_id,
            dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 300.into()],
                "Rotate" => 90,
            }
            .into(),
        );
        doc.objects.insert(
            root_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![node_id.into()],
                "Count" => 1,
                "Resources" => dictionary! {},
                "Rotate" => 180,
            }
            .into(),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => root_id });
        doc.trailer.set("Root", catalog);

        (doc, page_id)
    }

    #[test]
    fn test_flatten_takes_nearest_ancestor() {
        let (mut doc, page_id) = nested_document();
        flatten_inherited_attributes(&mut doc, page_id).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert!(!page.has(b"CropBox"));
    }

    #[test]
    fn test_set_page_tree_reparents() {
        let (mut doc, page_id) = nested_document();
        flatten_inherited_attributes(&mut doc, page_id).unwrap();
        set_page_tree(&mut doc, &[page_id]).unwrap();

        let root_id = pages_root_id(&doc).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), root_id);
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_collect_paths_expands_and_keeps_literals() {
        let dir = TempDir::new().unwrap();
        for name in ["a.pdf", "b.pdf", "c.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*.pdf", dir.path().display());
        let missing = format!("{}/missing.pdf", dir.path().display());
        let paths = collect_paths_for_patterns([pattern.as_str(), missing.as_str()]).unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("a.pdf"),
                dir.path().join("b.pdf"),
                PathBuf::from(missing),
            ]
        );
    }

    #[test]
    fn test_collect_paths_rejects_bad_pattern() {
        assert!(collect_paths_for_patterns(["[unclosed"]).is_err());
    }
}
