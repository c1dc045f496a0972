use pdftoolkit::print::{PaperSize, PdfPrintSink, print_document};
use pdftoolkit::render::RenderParams;
use pdftoolkit::render::parallel::BackgroundRender;
use pdftoolkit::render::raster::RasterDocument;
use pdftoolkit::render::stream::PageStream;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{SolidRenderer, load, own_media_box, write_png};

#[test]
fn test_print_image_to_a4() {
    let dir = TempDir::new().unwrap();
    let png = write_png(dir.path(), "photo.png", 120, 80);
    let document = RasterDocument::open(&png).unwrap();

    let mut stream = PageStream::new(&document, RenderParams::default());
    let mut sink = PdfPrintSink::new(dir.path().join("printed"));
    let sheets = print_document(&mut stream, &mut sink, PaperSize::A4, 18.0).unwrap();

    assert_eq!(sheets, 1);
    let written = sink.written().unwrap().to_path_buf();
    assert_eq!(written, dir.path().join("printed.pdf"));

    let doc = load(&written);
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
    assert_eq!(own_media_box(&doc, pages[&1]).unwrap(), vec![0.0, 0.0, 595.0, 842.0]);

    let content = String::from_utf8_lossy(&doc.get_page_content(pages[&1]).unwrap()).into_owned();
    assert!(content.contains("Do"));
}

#[test]
fn test_print_background_render_on_letter() {
    let dir = TempDir::new().unwrap();
    let renderer = Arc::new(SolidRenderer::new(3));
    let mut source = BackgroundRender::spawn(renderer, RenderParams::default(), 1).unwrap();

    let mut sink = PdfPrintSink::new(dir.path().join("sheets.pdf"));
    let sheets = print_document(&mut source, &mut sink, PaperSize::Letter, 36.0).unwrap();

    assert_eq!(sheets, 3);
    assert_eq!(sink.sheet_count(), 3);

    let doc = load(sink.written().unwrap());
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    for page_id in pages.values() {
        assert_eq!(own_media_box(&doc, *page_id).unwrap(), vec![0.0, 0.0, 612.0, 792.0]);
    }
}

#[test]
fn test_print_rejects_oversized_margin() {
    let dir = TempDir::new().unwrap();
    let renderer = SolidRenderer::new(1);
    let mut stream = PageStream::new(&renderer, RenderParams::default());
    let output = dir.path().join("never.pdf");

    let mut sink = PdfPrintSink::new(&output);
    let custom: PaperSize = "200x200".parse().unwrap();

    assert!(print_document(&mut stream, &mut sink, custom, 120.0).is_err());
    assert!(!output.exists());
}
