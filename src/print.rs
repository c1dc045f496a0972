//! Printing rendered pages.
//!
//! Every rendered page is fitted onto one sheet of paper: scaled to the
//! printable area with its aspect ratio kept, and centred. A [`PrintSink`]
//! receives one `begin_page` per sheet followed by the draw call. Spooling to
//! a physical printer is left to the operating system; [`PdfPrintSink`]
//! writes a print-ready PDF instead.

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Result, ToolkitError};
use crate::io::writer::PdfWriter;
use crate::loader::{PageSource, Pull};

/// Paper size in PostScript points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PaperSize {
    /// 210 x 297 mm.
    #[default]
    A4,
    /// 8.5 x 11 in.
    Letter,
    /// Any other size.
    Custom {
        /// Width in points.
        width: f32,
        /// Height in points.
        height: f32,
    },
}

impl PaperSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match *self {
            PaperSize::A4 => (595.0, 842.0),
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::Custom { width, height } => (width, height),
        }
    }
}

impl FromStr for PaperSize {
    type Err = ToolkitError;

    /// Accepts `a4`, `letter`, or `WIDTHxHEIGHT` in points.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            custom => {
                let parsed = custom
                    .split_once('x')
                    .and_then(|(w, h)| Some((w.trim().parse::<f32>().ok()?, h.trim().parse::<f32>().ok()?)));
                match parsed {
                    Some((width, height)) if width > 0.0 && height > 0.0 => {
                        Ok(PaperSize::Custom { width, height })
                    }
                    _ => Err(ToolkitError::invalid_config(format!(
                        "Unknown paper size '{s}' (expected a4, letter or WIDTHxHEIGHT in points)"
                    ))),
                }
            }
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::A4 => write!(f, "A4"),
            PaperSize::Letter => write!(f, "Letter"),
            PaperSize::Custom { width, height } => write!(f, "{width}x{height}pt"),
        }
    }
}

/// Axis-aligned rectangle in points, origin at the bottom left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Distance of the left edge from the left side of the paper.
    pub x: f32,
    /// Distance of the bottom edge from the bottom of the paper.
    pub y: f32,
    /// Extent to the right of `x`.
    pub width: f32,
    /// Extent upwards from `y`.
    pub height: f32,
}

/// Part of the paper inside `margin` points on every side.
///
/// # Errors
///
/// Returns [`ToolkitError::InvalidConfig`] if the margin is negative or
/// leaves no printable area.
pub fn printable_area(paper: PaperSize, margin: f32) -> Result<Rect> {
    let (width, height) = paper.dimensions();
    let rect = Rect {
        x: margin,
        y: margin,
        width: width - 2.0 * margin,
        height: height - 2.0 * margin,
    };

    if margin.is_nan() || margin < 0.0 || rect.width <= 0.0 || rect.height <= 0.0 {
        return Err(ToolkitError::invalid_config(format!(
            "Margin of {margin}pt leaves no printable area on {paper}"
        )));
    }
    Ok(rect)
}

/// Scale a `bitmap_width` x `bitmap_height` bitmap to fit `printable`,
/// keeping its aspect ratio, and centre it.
pub fn fit_to_page(bitmap_width: u32, bitmap_height: u32, printable: Rect) -> Rect {
    if bitmap_width == 0 || bitmap_height == 0 {
        return Rect {
            x: printable.x + printable.width / 2.0,
            y: printable.y + printable.height / 2.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let factor = (printable.width / bitmap_width as f32).min(printable.height / bitmap_height as f32);
    let width = bitmap_width as f32 * factor;
    let height = bitmap_height as f32 * factor;

    Rect {
        x: printable.x + (printable.width - width) / 2.0,
        y: printable.y + (printable.height - height) / 2.0,
        width,
        height,
    }
}

/// Destination for printed sheets.
pub trait PrintSink {
    /// Start a new sheet. This is the page break.
    fn begin_page(&mut self, width: f32, height: f32) -> Result<()>;

    /// Draw `bitmap` into `rect` on the current sheet.
    fn draw(&mut self, bitmap: &RgbaImage, rect: Rect) -> Result<()>;

    /// Flush everything. No calls are made afterwards.
    fn finish(&mut self) -> Result<()>;
}

/// Print every page `source` yields, one page per sheet.
///
/// Returns the number of sheets printed.
///
/// # Errors
///
/// Returns the first error from the source or the sink.
pub fn print_document<S, K>(source: &mut S, sink: &mut K, paper: PaperSize, margin: f32) -> Result<usize>
where
    S: PageSource + ?Sized,
    K: PrintSink + ?Sized,
{
    let printable = printable_area(paper, margin)?;
    let (paper_width, paper_height) = paper.dimensions();
    let mut sheets = 0;

    loop {
        match source.pull() {
            Pull::Page(page) => {
                let rect = fit_to_page(page.width(), page.height(), printable);
                sink.begin_page(paper_width, paper_height)?;
                sink.draw(&page.bitmap, rect)?;
                sheets += 1;
                debug!(page = page.page_number, "printed page");
            }
            Pull::Pending => std::thread::yield_now(),
            Pull::Failed(err) => return Err(err),
            Pull::Exhausted => break,
        }
    }

    sink.finish()?;
    info!(sheets, paper = %paper, "print finished");
    Ok(sheets)
}

/// Sheet being filled by [`PdfPrintSink`].
struct Sheet {
    width: f32,
    height: f32,
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// Writes printed sheets to a PDF file.
pub struct PdfPrintSink {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    current: Option<Sheet>,
    output: PathBuf,
    writer: PdfWriter,
    written: Option<PathBuf>,
}

impl PdfPrintSink {
    /// Sink writing to `output` on [`finish`](PrintSink::finish).
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            current: None,
            output: output.into(),
            writer: PdfWriter::default(),
            written: None,
        }
    }

    /// Sheets completed so far.
    pub fn sheet_count(&self) -> usize {
        self.kids.len() + usize::from(self.current.is_some())
    }

    /// Path written by `finish`, once it has run.
    pub fn written(&self) -> Option<&Path> {
        self.written.as_deref()
    }

    fn close_sheet(&mut self) -> Result<()> {
        let Some(sheet) = self.current.take() else {
            return Ok(());
        };

        let content = Content {
            operations: sheet.operations,
        };
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), sheet.width.into(), sheet.height.into()],
            "Resources" => dictionary! { "XObject" => sheet.xobjects },
            "Contents" => content_id,
        });
        self.kids.push(page_id);
        Ok(())
    }
}

impl PrintSink for PdfPrintSink {
    fn begin_page(&mut self, width: f32, height: f32) -> Result<()> {
        self.close_sheet()?;
        self.current = Some(Sheet {
            width,
            height,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
        });
        Ok(())
    }

    fn draw(&mut self, bitmap: &RgbaImage, rect: Rect) -> Result<()> {
        let sheet = self
            .current
            .as_mut()
            .ok_or_else(|| ToolkitError::other("draw called before begin_page"))?;
        let image_id = add_image(&mut self.doc, bitmap);
        let name = format!("Im{}", sheet.xobjects.len());
        sheet.xobjects.set(name.as_bytes(), image_id);
        sheet.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    rect.width.into(),
                    0.into(),
                    0.into(),
                    rect.height.into(),
                    rect.x.into(),
                    rect.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.close_sheet()?;

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
                "Count" => Object::Integer(self.kids.len() as i64),
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let stats = self.writer.save_blocking(&mut self.doc, &self.output)?;
        self.written = Some(stats.output_path);
        Ok(())
    }
}

/// Add `bitmap` as an RGB image XObject, with a soft mask when any pixel is
/// not opaque.
fn add_image(doc: &mut Document, bitmap: &RgbaImage) -> ObjectId {
    let (width, height) = bitmap.dimensions();
    let (width, height) = (i64::from(width), i64::from(height));

    let rgb: Vec<u8> = bitmap.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect();
    let mut xobject = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if bitmap.pixels().any(|p| p[3] != u8::MAX) {
        let alpha: Vec<u8> = bitmap.pixels().map(|p| p[3]).collect();
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        xobject.set("SMask", mask_id);
    }

    doc.add_object(Stream::new(xobject, rgb))
}
