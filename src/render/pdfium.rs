//! PDFium-backed rendering.
//!
//! PDFium is a dynamic library bound at runtime. [`bind_pdfium`] looks for it
//! in, in order: the directory named by `PDFTOOLKIT_PDFIUM_DIR`,
//! `./resources/pdfium/lib`, the working directory, and finally the system
//! library path.

use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::PDFIUM_DIR_ENV;
use crate::error::{Result, ToolkitError};
use crate::render::{PageRenderer, RenderParams, Rotation, target_size};

/// Directories searched for the PDFium library, most specific first.
pub fn library_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(dir) = std::env::var_os(PDFIUM_DIR_ENV).filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir));
    }

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join("resources").join("pdfium").join("lib"));
        dirs.push(cwd);
    }

    dirs
}

/// Bind the PDFium library.
///
/// # Errors
///
/// Returns [`ToolkitError::RendererUnavailable`] if no candidate location
/// holds a loadable library.
pub fn bind_pdfium() -> Result<Pdfium> {
    for dir in library_search_dirs() {
        let library = Pdfium::pdfium_platform_library_name_at_path(&dir);
        match Pdfium::bind_to_library(&library) {
            Ok(bindings) => {
                info!(library = %library.display(), "bound PDFium");
                return Ok(Pdfium::new(bindings));
            }
            Err(err) => debug!(library = %library.display(), error = %err, "PDFium not found"),
        }
    }

    Pdfium::bind_to_system_library()
        .map(|bindings| {
            info!("bound system PDFium");
            Pdfium::new(bindings)
        })
        .map_err(|err| ToolkitError::RendererUnavailable {
            reason: err.to_string(),
        })
}

/// An open PDF, rasterised through PDFium.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    path: PathBuf,
}

impl<'a> PdfiumDocument<'a> {
    /// Open a PDF file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::FailedToLoadPdf`] if PDFium cannot open it.
    pub fn open(pdfium: &'a Pdfium, path: &Path) -> Result<Self> {
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ToolkitError::failed_to_load_pdf(path.to_path_buf(), e.to_string()))?;

        Ok(Self {
            document,
            path: path.to_path_buf(),
        })
    }

    /// Path the document was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageRenderer for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage> {
        let page_index = u16::try_from(index)
            .map_err(|_| ToolkitError::render_failed(index + 1, "page index out of range"))?;

        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| ToolkitError::render_failed(index + 1, e.to_string()))?;
        target_size(index + 1, page.width().value, page.height().value, params.scale())?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(params.scale())
            .rotate(render_rotation(params.rotation()), true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ToolkitError::render_failed(index + 1, e.to_string()))?;

        Ok(bitmap.as_image().to_rgba8())
    }
}

fn render_rotation(rotation: Rotation) -> PdfPageRenderRotation {
    match rotation {
        Rotation::None => PdfPageRenderRotation::None,
        Rotation::Clockwise90 => PdfPageRenderRotation::Degrees90,
        Rotation::Rotate180 => PdfPageRenderRotation::Degrees180,
        Rotation::Clockwise270 => PdfPageRenderRotation::Degrees270,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_search_dirs_prefer_env_var() {
        // SAFETY: serialised with the other tests touching the environment.
        unsafe { std::env::set_var(PDFIUM_DIR_ENV, "/opt/pdfium/lib") };
        let dirs = library_search_dirs();
        unsafe { std::env::remove_var(PDFIUM_DIR_ENV) };

        assert_eq!(dirs.first(), Some(&PathBuf::from("/opt/pdfium/lib")));
    }

    #[test]
    #[serial]
    fn test_search_dirs_without_env_var() {
        unsafe { std::env::remove_var(PDFIUM_DIR_ENV) };
        let dirs = library_search_dirs();

        assert!(dirs.iter().all(|d| d != Path::new("/opt/pdfium/lib")));
        assert!(dirs.iter().any(|d| d.ends_with("resources/pdfium/lib")));
    }

    #[test]
    fn test_render_rotation_mapping() {
        assert!(matches!(
            render_rotation(Rotation::Clockwise90),
            PdfPageRenderRotation::Degrees90
        ));
        assert!(matches!(
            render_rotation(Rotation::None),
            PdfPageRenderRotation::None
        ));
    }
}
