//! Configuration for pdftoolkit operations.
//!
//! CLI arguments are turned into one of the validated structs below before
//! any file is touched. This module handles:
//! - Parsing of page selections and render parameters
//! - Resolution of overwrite behaviour
//! - Application of defaults
//! - Validation of argument combinations

use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ToolkitError;
use crate::print::PaperSize;
use crate::render::stream::RenderFailurePolicy;
use crate::render::{MAX_SCALE, RenderParams, Rotation};

/// Environment variable naming the directory that holds the PDFium library.
pub const PDFIUM_DIR_ENV: &str = "PDFTOOLKIT_PDFIUM_DIR";

/// Minimum number of sources accepted by the combine flow.
pub const MIN_COMBINE_SOURCES: usize = 2;

/// Scale used for thumbnails when none is given.
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.5;

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

impl OverwriteMode {
    /// Resolve the mode from the `--force` and `--no-clobber` flags.
    pub fn from_flags(force: bool, no_clobber: bool) -> Self {
        match (force, no_clobber) {
            (true, _) => Self::Force,
            (false, true) => Self::NoClobber,
            (false, false) => Self::Prompt,
        }
    }
}

/// A set of 1-based page numbers, e.g. pages marked for removal.
///
/// Parsed from strings such as:
/// - "2" - single page
/// - "2-4" - range of pages (inclusive)
/// - "1,3,5" - multiple individual pages
/// - "" or "none" - the empty selection
///
/// Ranges are kept as sorted, disjoint `(first, last)` pairs and only
/// expanded against a known page count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    ranges: Vec<(u32, u32)>,
}

impl PageSelection {
    /// Parse a page selection string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string contains a malformed range or a page
    /// number that is zero or not a number.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdftoolkit::config::PageSelection;
    ///
    /// let selection = PageSelection::parse("2,4-5").unwrap();
    /// assert!(selection.contains(4));
    /// assert!(!selection.contains(3));
    /// assert_eq!(selection.len(), 3);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::default());
        }

        let mut ranges = Vec::new();

        for part in trimmed.split(',') {
            let part = part.trim();

            if part.is_empty() {
                bail!("Empty entry in page selection: '{s}'");
            }

            if let Some((start, end)) = part.split_once('-') {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;

                if start > end {
                    bail!(
                        "Invalid range {start}-{end}: start page must be less than or equal to end page"
                    );
                }

                ranges.push((start, end));
            } else {
                let page = parse_page_number(part)?;
                ranges.push((page, page));
            }
        }

        Ok(Self::from_ranges(ranges))
    }

    /// Build a selection from page numbers.
    pub fn from_pages(pages: impl IntoIterator<Item = u32>) -> Self {
        Self::from_ranges(pages.into_iter().map(|page| (page, page)).collect())
    }

    fn from_ranges(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        Self { ranges: merged }
    }

    /// Check if a page number is selected.
    pub fn contains(&self, page: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&page))
    }

    /// Number of selected pages.
    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .map(|&(start, end)| (end - start) as usize + 1)
            .sum()
    }

    /// Whether no page is selected.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Highest selected page number, if any.
    pub fn max_page(&self) -> Option<u32> {
        self.ranges.last().map(|&(_, end)| end)
    }

    /// The selected page numbers, ascending.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|&(start, end)| start..=end)
    }

    /// The selected pages as a set, or `None` if any lies past `total_pages`.
    pub fn within(&self, total_pages: usize) -> Option<BTreeSet<u32>> {
        match self.max_page() {
            Some(max) if max as usize > total_pages => None,
            _ => Some(self.pages().collect()),
        }
    }
}

impl FromStr for PageSelection {
    type Err = ToolkitError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s).map_err(|err| ToolkitError::invalid_config(format!("{err:#}")))
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .ranges
            .iter()
            .map(|&(start, end)| match end - start {
                0 => start.to_string(),
                1 => format!("{start},{end}"),
                _ => format!("{start}-{end}"),
            })
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

fn parse_page_number(s: &str) -> Result<u32> {
    let page: u32 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid page number: {}", s.trim()))?;

    if page == 0 {
        bail!("Page numbers must be positive (1-indexed)");
    }

    Ok(page)
}

/// Configuration for combining sources into one PDF.
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// Source paths (PDFs and images), in output order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF file path.
    pub output: PathBuf,

    /// Validate and plan without writing.
    pub dry_run: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Only use the primary strategy.
    pub no_fallback: bool,
}

impl CombineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than [`MIN_COMBINE_SOURCES`] inputs are
    /// given, or if the output path is also an input.
    pub fn validate(&self) -> crate::Result<()> {
        if self.inputs.len() < MIN_COMBINE_SOURCES {
            return Err(ToolkitError::NotEnoughSources {
                required: MIN_COMBINE_SOURCES,
                found: self.inputs.len(),
            });
        }

        if self.inputs.iter().any(|input| input == &self.output) {
            return Err(ToolkitError::invalid_config(format!(
                "Output file cannot be the same as an input file: {}",
                self.output.display()
            )));
        }

        Ok(())
    }
}

/// Configuration for removing pages from one PDF.
#[derive(Debug, Clone)]
pub struct RemoveConfig {
    /// Source PDF path.
    pub input: PathBuf,

    /// Output PDF file path.
    pub output: PathBuf,

    /// Pages to remove. `None` means nothing was selected.
    pub selection: Option<PageSelection>,

    /// Permit writing a document with no pages.
    pub allow_empty: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,
}

impl RemoveConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoPageSelection`] when no selection was made,
    /// and an error when the output path equals the input path.
    pub fn validate(&self) -> crate::Result<()> {
        if self.selection.is_none() {
            return Err(ToolkitError::NoPageSelection);
        }

        if self.input == self.output {
            return Err(ToolkitError::invalid_config(format!(
                "Output file cannot be the same as the input file: {}",
                self.output.display()
            )));
        }

        Ok(())
    }
}

/// Configuration for rendering thumbnails of one or more sources.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Sources to render.
    pub inputs: Vec<PathBuf>,

    /// Directory that receives one PNG per page.
    pub out_dir: PathBuf,

    /// Render parameters for every page.
    pub params: RenderParams,

    /// Number of parallel render jobs (None = auto-detect).
    pub jobs: Option<usize>,

    /// What to do when a page fails to render.
    pub failure_policy: RenderFailurePolicy,
}

impl ThumbnailConfig {
    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Tunables for the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    /// Factor applied by one zoom-in step (its inverse for zoom-out).
    pub zoom_step: f32,

    /// Smallest accepted scale.
    pub min_scale: f32,

    /// Largest accepted scale.
    pub max_scale: f32,

    /// Vertical gap between pages, in pixels.
    pub page_spacing: u32,

    /// Initial render parameters.
    pub initial: RenderParams,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_step: 1.25,
            min_scale: 0.1,
            max_scale: MAX_SCALE,
            page_spacing: 10,
            initial: RenderParams::default(),
        }
    }
}

impl ViewerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.zoom_step > 1.0) {
            return Err(ToolkitError::invalid_config(
                "Zoom step must be greater than 1",
            ));
        }

        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale <= MAX_SCALE) {
            return Err(ToolkitError::invalid_config(format!(
                "Invalid zoom limits: {} to {}",
                self.min_scale, self.max_scale
            )));
        }

        Ok(())
    }
}

/// Configuration for printing a document to a print-ready PDF.
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Source to print.
    pub input: PathBuf,

    /// Output PDF file path.
    pub output: PathBuf,

    /// Paper each rendered page is fitted onto.
    pub paper: PaperSize,

    /// Margin around the printable area, in points.
    pub margin: f32,

    /// Render parameters for rasterising the pages.
    pub params: RenderParams,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,
}

/// Parse rotation degrees given on the command line.
pub fn parse_rotation(degrees: &str) -> crate::Result<Rotation> {
    let value: u16 = degrees.trim().parse().map_err(|_| {
        ToolkitError::invalid_render_params(format!("Invalid rotation: {degrees}"))
    })?;
    Rotation::from_degrees(value)
}
