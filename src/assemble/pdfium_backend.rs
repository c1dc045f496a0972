//! Fallback assembly strategy, built on PDFium.
//!
//! PDFium copes with some damaged files that lopdf refuses. Pages are copied
//! with `FPDF_ImportPages`, images are placed on pages sized to them.

use image::GenericImageView;
use pdfium_render::prelude::*;
use std::path::Path;

use crate::assemble::AssemblyStrategy;
use crate::error::{Result, ToolkitError};
use crate::io::{SourceFile, SourceKind};

/// Combines sources through a bound PDFium library.
pub struct PdfiumStrategy<'a> {
    pdfium: &'a Pdfium,
}

impl<'a> PdfiumStrategy<'a> {
    /// Strategy using an already bound library.
    pub fn new(pdfium: &'a Pdfium) -> Self {
        Self { pdfium }
    }

    fn append_image(&self, combined: &mut PdfDocument<'a>, path: &Path) -> Result<()> {
        let image = image::open(path)
            .map_err(|e| ToolkitError::failed_to_load_image(path.to_path_buf(), e.to_string()))?;
        let (width, height) = image.dimensions();
        let width = PdfPoints::new(width as f32);
        let height = PdfPoints::new(height as f32);

        let mut page = combined
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(pdfium_error)?;

        page.objects_mut()
            .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, &image, Some(width), Some(height))
            .map_err(pdfium_error)?;

        Ok(())
    }
}

impl AssemblyStrategy for PdfiumStrategy<'_> {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn assemble(&self, sources: &[SourceFile], output: &Path) -> Result<usize> {
        let mut combined = self.pdfium.create_new_pdf().map_err(pdfium_error)?;

        for source in sources {
            match source.kind {
                SourceKind::Pdf => {
                    let document = self
                        .pdfium
                        .load_pdf_from_file(&source.path, None)
                        .map_err(|e| {
                            ToolkitError::failed_to_load_pdf(source.path.clone(), e.to_string())
                        })?;
                    combined
                        .pages_mut()
                        .append(&document)
                        .map_err(pdfium_error)?;
                }
                SourceKind::Image(_) => self.append_image(&mut combined, &source.path)?,
            }
        }

        let page_count = combined.pages().len() as usize;
        combined
            .save_to_file(output)
            .map_err(|e| ToolkitError::FailedToWrite {
                path: output.to_path_buf(),
                source: std::io::Error::other(e.to_string()),
            })?;

        Ok(page_count)
    }
}

fn pdfium_error(err: PdfiumError) -> ToolkitError {
    ToolkitError::other(format!("PDFium: {err}"))
}
