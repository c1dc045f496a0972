//! Raster image sources rendered as single-page documents.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolkitError};
use crate::render::{PageRenderer, RenderParams, Rotation, target_size};

/// A PNG/JPEG/BMP/GIF file viewed as a one-page document.
///
/// Scale 1.0 reproduces the image at its native pixel size, matching the
/// page the assembler creates for it.
#[derive(Debug, Clone)]
pub struct RasterDocument {
    image: RgbaImage,
    path: PathBuf,
}

impl RasterDocument {
    /// Decode an image file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::FailedToLoadImage`] if the file cannot be
    /// opened or decoded.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| ToolkitError::failed_to_load_image(path.to_path_buf(), e.to_string()))?;
        Ok(Self::from_image(image, path.to_path_buf()))
    }

    /// Wrap an already decoded image.
    pub fn from_image(image: DynamicImage, path: PathBuf) -> Self {
        Self {
            image: image.to_rgba8(),
            path,
        }
    }

    /// Native size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Path the image was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageRenderer for RasterDocument {
    fn page_count(&self) -> usize {
        1
    }

    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage> {
        if index != 0 {
            return Err(ToolkitError::render_failed(
                index + 1,
                format!("{} has a single page", self.path.display()),
            ));
        }

        let (width, height) = self.image.dimensions();
        let (target_width, target_height) =
            target_size(index + 1, width as f32, height as f32, params.scale())?;

        let scaled_image = if (target_width, target_height) == (width, height) {
            self.image.clone()
        } else {
            imageops::resize(&self.image, target_width, target_height, FilterType::Triangle)
        };

        Ok(match params.rotation() {
            Rotation::None => scaled_image,
            Rotation::Clockwise90 => imageops::rotate90(&scaled_image),
            Rotation::Rotate180 => imageops::rotate180(&scaled_image),
            Rotation::Clockwise270 => imageops::rotate270(&scaled_image),
        })
    }
}
