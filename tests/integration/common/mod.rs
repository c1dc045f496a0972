//! Fixtures for the integration tests.
//!
//! Documents are generated at test time with lopdf and image, so every page
//! carries a recognisable content stream ("<label> <n>") that survives
//! combining and page removal byte for byte.

#![allow(dead_code)]

use image::{Rgb, RgbImage, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::path::{Path, PathBuf};

use pdftoolkit::Result;
use pdftoolkit::render::{PageRenderer, RenderParams};

/// Write a PDF whose page `n` draws the text `"<label> <n>"`.
pub fn write_labelled_pdf(dir: &Path, name: &str, label: &str, pages: u32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (1..=pages)
        .map(|n| labelled_page(&mut doc, pages_id, &format!("{label} {n}")).into())
        .collect();

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }
        .into(),
    );
    finish(doc, pages_id, dir, name)
}

/// Write a two-page PDF whose pages sit under an intermediate `Pages` node
/// and inherit their MediaBox (300 x 400) from it.
pub fn write_nested_pdf(dir: &Path, name: &str) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let middle_id = doc.new_object_id();

    let first = labelled_page(&mut doc, middle_id, "Nested 1");
    let second = labelled_page(&mut doc, middle_id, "Nested 2");

    doc.objects.insert(
        middle_id,
        dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => vec![first.into(), second.into()],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
        }
        .into(),
    );
    doc.objects.insert(
        root_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![middle_id.into()],
            "Count" => 2,
        }
        .into(),
    );
    finish(doc, root_id, dir, name)
}

fn labelled_page(doc: &mut Document, parent: ObjectId, text: &str) -> ObjectId {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
    })
}

fn finish(mut doc: Document, pages_id: ObjectId, dir: &Path, name: &str) -> PathBuf {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Write a solid PNG of the given size.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([30, 120, 200]))
        .save(&path)
        .unwrap();
    path
}

/// Load a PDF from disk.
pub fn load(path: &Path) -> Document {
    Document::load_mem(&std::fs::read(path).unwrap()).unwrap()
}

/// Decoded content stream of every page, in page order.
pub fn page_texts(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

/// The label drawn by each page, in page order. Empty for image pages.
pub fn page_labels(doc: &Document) -> Vec<String> {
    page_texts(doc)
        .iter()
        .map(|text| {
            text.split_once('(')
                .and_then(|(_, rest)| rest.split_once(')'))
                .map(|(label, _)| label.to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// MediaBox of a page, as found on the page itself.
pub fn own_media_box(doc: &Document, page_id: ObjectId) -> Option<Vec<f32>> {
    let page = doc.get_dictionary(page_id).ok()?;
    let values = page.get(b"MediaBox").ok()?.as_array().ok()?;
    values.iter().map(|v| v.as_float().ok()).collect()
}

/// Renderer producing solid pages of a fixed size, for tests that do not
/// need PDFium.
pub struct SolidRenderer {
    pub pages: usize,
    pub width: u32,
    pub height: u32,
}

impl SolidRenderer {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            width: 100,
            height: 200,
        }
    }
}

impl PageRenderer for SolidRenderer {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage> {
        if index >= self.pages {
            return Err(pdftoolkit::ToolkitError::render_failed(index + 1, "no such page"));
        }

        let width = (self.width as f32 * params.scale()).round() as u32;
        let height = (self.height as f32 * params.scale()).round() as u32;
        let (width, height) = if params.rotation().is_sideways() {
            (height, width)
        } else {
            (width, height)
        };
        Ok(RgbaImage::from_pixel(width, height, image::Rgba([index as u8, 0, 0, 255])))
    }
}
