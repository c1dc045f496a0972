use pdftoolkit::ToolkitError;
use pdftoolkit::config::PageSelection;
use pdftoolkit::session::Session;
use pdftoolkit::split::PageRemover;
use std::collections::BTreeSet;
use tempfile::TempDir;

use crate::common::{load, page_labels, page_texts, write_labelled_pdf};

#[test]
fn test_remove_even_pages() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 5);

    let exclusions = BTreeSet::from([2, 4]);
    let report = PageRemover::new()
        .remove(&source, Some(&exclusions), &dir.path().join("odd.pdf"))
        .unwrap();

    assert_eq!(report.original_pages, 5);
    assert_eq!(report.kept, vec![1, 3, 5]);
    assert_eq!(report.removed(), 2);
    assert_eq!(page_labels(&load(&report.output)), ["Page 1", "Page 3", "Page 5"]);
}

#[test]
fn test_empty_selection_copies_document() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 3);

    let report = PageRemover::new()
        .remove(&source, Some(&BTreeSet::new()), &dir.path().join("copy.pdf"))
        .unwrap();

    assert_eq!(report.removed(), 0);
    assert_eq!(page_texts(&load(&report.output)), page_texts(&load(&source)));
}

#[test]
fn test_missing_selection_is_refused() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 3);
    let output = dir.path().join("out.pdf");

    let err = PageRemover::new().remove(&source, None, &output).unwrap_err();

    assert!(matches!(err, ToolkitError::NoPageSelection));
    assert!(!output.exists());
}

#[test]
fn test_out_of_range_selection_is_refused() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 3);

    let err = PageRemover::new()
        .remove(&source, Some(&BTreeSet::from([2, 7])), &dir.path().join("out.pdf"))
        .unwrap_err();

    match err {
        ToolkitError::InvalidPageSelection { total_pages, .. } => assert_eq!(total_pages, 3),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unbounded_range_is_refused_without_expanding() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 3);
    let output = dir.path().join("out.pdf");

    let selection: PageSelection = "2-4294967295".parse().unwrap();
    let err = PageRemover::new()
        .remove_selection(&source, Some(&selection), &output)
        .unwrap_err();

    match err {
        ToolkitError::InvalidPageSelection {
            selection,
            total_pages,
            ..
        } => {
            assert_eq!(selection, "2-4294967295");
            assert_eq!(total_pages, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_session_selection_drives_removal() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 6);

    let mut session = Session::new();
    session.split.select_source(&source, 6);
    session.split.toggle(2);
    session.split.extend_to(4);
    session.split.toggle(6);
    assert_eq!(session.split.remaining(), 2);

    let report = PageRemover::new()
        .remove(
            session.split.source().unwrap(),
            session.split.exclusions(),
            &dir.path().join("out.pdf"),
        )
        .unwrap();

    assert_eq!(report.kept, vec![1, 5]);
    assert_eq!(page_labels(&load(&report.output)), ["Page 1", "Page 5"]);
}

#[test]
fn test_untouched_session_selection_is_refused() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 2);

    let mut session = Session::new();
    session.split.select_source(&source, 2);

    let err = PageRemover::new()
        .remove(&source, session.split.exclusions(), &dir.path().join("out.pdf"))
        .unwrap_err();
    assert!(matches!(err, ToolkitError::NoPageSelection));
}

#[test]
fn test_removing_every_page() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 2);
    let everything = BTreeSet::from([1, 2]);

    let err = PageRemover::new()
        .remove(&source, Some(&everything), &dir.path().join("none.pdf"))
        .unwrap_err();
    assert!(matches!(err, ToolkitError::WouldRemoveAllPages { total_pages: 2, .. }));

    let report = PageRemover::new()
        .allow_empty(true)
        .remove(&source, Some(&everything), &dir.path().join("empty.pdf"))
        .unwrap();
    assert!(report.kept.is_empty());
    assert!(report.output.exists());
}

#[test]
fn test_output_gets_pdf_extension() {
    let dir = TempDir::new().unwrap();
    let source = write_labelled_pdf(dir.path(), "doc.pdf", "Page", 2);

    let report = PageRemover::new()
        .remove(&source, Some(&BTreeSet::from([1])), &dir.path().join("trimmed"))
        .unwrap();

    assert_eq!(report.output, dir.path().join("trimmed.pdf"));
    assert_eq!(page_labels(&load(&report.output)), ["Page 2"]);
}
