//! Page rasterisation.
//!
//! The actual rasterisation is delegated: PDF pages go through PDFium
//! ([`pdfium::PdfiumDocument`]), image sources through the `image` crate
//! ([`raster::RasterDocument`]). Both sit behind [`PageRenderer`], which is all
//! the page stream, the loader and the viewer ever see.
//!
//! # Examples
//!
//! ```no_run
//! use pdftoolkit::render::{PageRenderer, RenderParams, Rotation};
//! use pdftoolkit::render::raster::RasterDocument;
//! use pdftoolkit::render::stream::PageStream;
//! use std::path::Path;
//!
//! # fn example() -> pdftoolkit::Result<()> {
//! let doc = RasterDocument::open(Path::new("scan.png"))?;
//! let params = RenderParams::new(0.5, Rotation::Clockwise90)?;
//! for page in PageStream::new(&doc, params) {
//!     let page = page?;
//!     println!("page {} is {}x{}", page.page_number, page.width(), page.height());
//! }
//! # Ok(())
//! # }
//! ```

pub mod parallel;
pub mod pdfium;
pub mod raster;
pub mod stream;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolkitError};

/// Largest accepted render scale.
pub const MAX_SCALE: f32 = 8.0;

/// Largest bitmap, in pixels, a single page may render to.
pub const MAX_BITMAP_PIXELS: u64 = 100_000_000;

/// Page rotation applied while rasterising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Upright.
    #[default]
    None,
    /// Rotate 90 degrees clockwise.
    Clockwise90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise (90 counter-clockwise).
    Clockwise270,
}

impl Rotation {
    /// Parse rotation from degrees.
    ///
    /// # Errors
    ///
    /// Returns an error unless `degrees` is 0, 90, 180 or 270.
    pub fn from_degrees(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Clockwise90),
            180 => Ok(Self::Rotate180),
            270 => Ok(Self::Clockwise270),
            _ => Err(ToolkitError::invalid_render_params(format!(
                "Invalid rotation: {degrees}. Must be 0, 90, 180, or 270"
            ))),
        }
    }

    /// Get rotation as degrees.
    pub fn as_degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// The next rotation, turning a quarter clockwise.
    pub fn clockwise(self) -> Self {
        match self {
            Self::None => Self::Clockwise90,
            Self::Clockwise90 => Self::Rotate180,
            Self::Rotate180 => Self::Clockwise270,
            Self::Clockwise270 => Self::None,
        }
    }

    /// The next rotation, turning a quarter counter-clockwise.
    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::None => Self::Clockwise270,
            Self::Clockwise90 => Self::None,
            Self::Rotate180 => Self::Clockwise90,
            Self::Clockwise270 => Self::Rotate180,
        }
    }

    /// Whether this rotation swaps width and height.
    pub fn is_sideways(&self) -> bool {
        matches!(self, Self::Clockwise90 | Self::Clockwise270)
    }
}

/// The (scale, rotation) pair controlling how a page is rasterised.
///
/// A scale of 1.0 renders one pixel per PDF point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderParams {
    scale: f32,
    rotation: Rotation,
}

impl RenderParams {
    /// Create render parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is not a positive, finite number no
    /// larger than [`MAX_SCALE`].
    pub fn new(scale: f32, rotation: Rotation) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ToolkitError::invalid_render_params(format!(
                "Scale must be a positive number, got {scale}"
            )));
        }

        if scale > MAX_SCALE {
            return Err(ToolkitError::invalid_render_params(format!(
                "Scale must be at most {MAX_SCALE}, got {scale}"
            )));
        }

        Ok(Self { scale, rotation })
    }

    /// Scale factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Same rotation, different scale.
    pub fn with_scale(self, scale: f32) -> Result<Self> {
        Self::new(scale, self.rotation)
    }

    /// Same scale, different rotation.
    pub fn with_rotation(self, rotation: Rotation) -> Self {
        Self { rotation, ..self }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: Rotation::None,
        }
    }
}

/// Pixel size of a `width` x `height` page rendered at `scale`.
///
/// # Errors
///
/// Returns [`ToolkitError::RenderFailed`] when the bitmap would exceed
/// [`MAX_BITMAP_PIXELS`].
pub fn target_size(page_number: usize, width: f32, height: f32, scale: f32) -> Result<(u32, u32)> {
    let target_width = (f64::from(width) * f64::from(scale)).round().max(1.0);
    let target_height = (f64::from(height) * f64::from(scale)).round().max(1.0);

    if target_width * target_height > MAX_BITMAP_PIXELS as f64 {
        return Err(ToolkitError::render_failed(
            page_number,
            format!(
                "bitmap of {target_width}x{target_height} pixels exceeds the limit of {MAX_BITMAP_PIXELS}"
            ),
        ));
    }

    Ok((target_width as u32, target_height as u32))
}

/// A rasterised page: the bitmap plus its 1-based page number.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page number within the source document.
    pub page_number: usize,

    /// The page bitmap.
    pub bitmap: RgbaImage,
}

impl RenderedPage {
    /// Bitmap width in pixels.
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    /// Bitmap height in pixels.
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// Something whose pages can be rasterised one at a time.
pub trait PageRenderer {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Rasterise the page at 0-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::RenderFailed`] if the page does not exist or
    /// the underlying library fails.
    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for &R {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage> {
        (**self).render_page(index, params)
    }
}

impl<R: PageRenderer + ?Sized> PageRenderer for std::sync::Arc<R> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage> {
        (**self).render_page(index, params)
    }
}

impl<R: PageRenderer + ?Sized> PageRenderer for Box<R> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn render_page(&self, index: usize, params: RenderParams) -> Result<RgbaImage> {
        (**self).render_page(index, params)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Rotation::None)]
    #[case(90, Rotation::Clockwise90)]
    #[case(180, Rotation::Rotate180)]
    #[case(270, Rotation::Clockwise270)]
    fn test_rotation_degrees(#[case] degrees: u16, #[case] rotation: Rotation) {
        assert_eq!(Rotation::from_degrees(degrees).unwrap(), rotation);
        assert_eq!(rotation.as_degrees(), degrees);
    }

    #[test]
    fn test_rotation_rejects_odd_angles() {
        assert!(Rotation::from_degrees(45).is_err());
        assert!(Rotation::from_degrees(360).is_err());
    }

    #[test]
    fn test_rotation_turns() {
        let mut rotation = Rotation::None;
        for _ in 0..4 {
            rotation = rotation.clockwise();
        }
        assert_eq!(rotation, Rotation::None);
        assert_eq!(Rotation::None.counter_clockwise(), Rotation::Clockwise270);
        assert_eq!(Rotation::Clockwise90.clockwise().counter_clockwise(), Rotation::Clockwise90);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    #[case(8.5)]
    #[case(1.0e6)]
    fn test_render_params_reject_bad_scale(#[case] scale: f32) {
        assert!(RenderParams::new(scale, Rotation::None).is_err());
    }

    #[test]
    fn test_target_size() {
        assert_eq!(target_size(1, 612.0, 792.0, 0.5).unwrap(), (306, 396));
        assert_eq!(target_size(1, 3.0, 3.0, 0.1).unwrap(), (1, 1));
        assert!(matches!(
            target_size(2, 20_000.0, 20_000.0, MAX_SCALE),
            Err(ToolkitError::RenderFailed { page: 2, .. })
        ));
    }

    #[test]
    fn test_render_params_builders() {
        let params = RenderParams::default();
        assert_eq!(params.scale(), 1.0);

        let params = params.with_scale(2.0).unwrap().with_rotation(Rotation::Rotate180);
        assert_eq!(params.scale(), 2.0);
        assert_eq!(params.rotation(), Rotation::Rotate180);
    }
}
