use pdftoolkit::ToolkitError;
use pdftoolkit::assemble::{Assembler, LopdfStrategy};
use pdftoolkit::io::{SourceFile, SourceKind};
use pdftoolkit::session::CombineList;
use tempfile::TempDir;

use crate::common::{load, own_media_box, page_labels, write_labelled_pdf, write_nested_pdf, write_png};

#[test]
fn test_combine_pdf_and_image() {
    let dir = TempDir::new().unwrap();
    let pdf = write_labelled_pdf(dir.path(), "a.pdf", "A", 3);
    let png = write_png(dir.path(), "image.png", 40, 30);

    let mut list = CombineList::new();
    list.add_all([pdf, png]);
    list.ensure_combinable().unwrap();

    let output = dir.path().join("combined.pdf");
    let report = Assembler::lopdf_only()
        .assemble(&list.sources().unwrap(), &output)
        .unwrap();

    assert_eq!(report.page_count, 4);
    assert_eq!(report.sources, 2);
    assert_eq!(report.strategy, "lopdf");
    assert!(report.fallbacks.is_empty());

    let doc = load(&report.output);
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 4);
    assert_eq!(&page_labels(&doc)[..3], ["A 1", "A 2", "A 3"]);

    let image_page = pages[&4];
    assert_eq!(own_media_box(&doc, image_page).unwrap(), vec![0.0, 0.0, 40.0, 30.0]);
}

#[test]
fn test_combine_keeps_source_order() {
    let dir = TempDir::new().unwrap();
    let first = write_labelled_pdf(dir.path(), "first.pdf", "First", 2);
    let second = write_labelled_pdf(dir.path(), "second.pdf", "Second", 1);

    let sources = vec![
        SourceFile::detect(&second).unwrap(),
        SourceFile::detect(&first).unwrap(),
    ];
    let report = Assembler::lopdf_only()
        .assemble(&sources, &dir.path().join("out.pdf"))
        .unwrap();

    let doc = load(&report.output);
    assert_eq!(page_labels(&doc), ["Second 1", "First 1", "First 2"]);
}

#[test]
fn test_combine_appends_pdf_extension() {
    let dir = TempDir::new().unwrap();
    let a = write_labelled_pdf(dir.path(), "a.pdf", "A", 1);
    let b = write_labelled_pdf(dir.path(), "b.pdf", "B", 1);

    let sources = vec![SourceFile::detect(&a).unwrap(), SourceFile::detect(&b).unwrap()];
    let report = Assembler::lopdf_only()
        .assemble(&sources, &dir.path().join("merged"))
        .unwrap();

    assert_eq!(report.output, dir.path().join("merged.pdf"));
    assert!(report.output.exists());
    assert!(!dir.path().join("merged").exists());
}

#[test]
fn test_combine_keeps_inherited_media_box() {
    let dir = TempDir::new().unwrap();
    let nested = write_nested_pdf(dir.path(), "nested.pdf");
    let flat = write_labelled_pdf(dir.path(), "flat.pdf", "Flat", 1);

    let sources = vec![
        SourceFile::detect(&nested).unwrap(),
        SourceFile::detect(&flat).unwrap(),
    ];
    let report = Assembler::lopdf_only()
        .assemble(&sources, &dir.path().join("out.pdf"))
        .unwrap();

    let doc = load(&report.output);
    let pages = doc.get_pages();
    assert_eq!(page_labels(&doc), ["Nested 1", "Nested 2", "Flat 1"]);
    assert_eq!(own_media_box(&doc, pages[&1]).unwrap(), vec![0.0, 0.0, 300.0, 400.0]);
    assert_eq!(own_media_box(&doc, pages[&2]).unwrap(), vec![0.0, 0.0, 300.0, 400.0]);
    assert_eq!(own_media_box(&doc, pages[&3]).unwrap(), vec![0.0, 0.0, 612.0, 792.0]);
}

#[test]
fn test_reversed_list_reverses_output() {
    let dir = TempDir::new().unwrap();
    let a = write_labelled_pdf(dir.path(), "a.pdf", "A", 1);
    let b = write_labelled_pdf(dir.path(), "b.pdf", "B", 1);
    let c = write_labelled_pdf(dir.path(), "c.pdf", "C", 1);

    let mut list = CombineList::new();
    list.add_all([a, b, c]);
    list.reverse();

    let report = Assembler::lopdf_only()
        .assemble(&list.sources().unwrap(), &dir.path().join("out.pdf"))
        .unwrap();

    assert_eq!(page_labels(&load(&report.output)), ["C 1", "B 1", "A 1"]);
}

#[test]
fn test_missing_source_fails_every_strategy() {
    let dir = TempDir::new().unwrap();
    let present = write_labelled_pdf(dir.path(), "present.pdf", "P", 1);
    let sources = vec![
        SourceFile::detect(&present).unwrap(),
        SourceFile::new(dir.path().join("gone.pdf"), SourceKind::Pdf),
    ];

    let output = dir.path().join("out.pdf");
    let err = Assembler::new()
        .with_strategy(LopdfStrategy::new())
        .assemble(&sources, &output)
        .unwrap_err();

    match err {
        ToolkitError::AssemblyFailed { attempts } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].strategy, "lopdf");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_missing_file_rejected_when_listing_sources() {
    let dir = TempDir::new().unwrap();
    let present = write_labelled_pdf(dir.path(), "present.pdf", "P", 1);

    let mut list = CombineList::new();
    list.add_all([present, dir.path().join("gone.pdf")]);

    assert!(matches!(
        list.sources(),
        Err(ToolkitError::FileNotFound { .. })
    ));
}

#[test]
fn test_duplicate_add_is_ignored() {
    let dir = TempDir::new().unwrap();
    let a = write_labelled_pdf(dir.path(), "a.pdf", "A", 1);

    let mut list = CombineList::new();
    assert!(list.add(&a));
    assert!(!list.add(&a));
    assert_eq!(list.len(), 1);
    assert!(matches!(
        list.ensure_combinable(),
        Err(ToolkitError::NotEnoughSources { required: 2, found: 1 })
    ));
}
