//! Command-line interface for pdftoolkit.
//!
//! Each subcommand has its own argument struct, converted into a validated
//! config from [`pdftoolkit::config`] before any file is touched.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use pdftoolkit::config::{
    CombineConfig, OverwriteMode, PageSelection, PrintConfig, RemoveConfig, ThumbnailConfig,
    ViewerConfig, parse_rotation,
};
use pdftoolkit::print::PaperSize;
use pdftoolkit::render::stream::RenderFailurePolicy;
use pdftoolkit::render::{RenderParams, Rotation};
use pdftoolkit::utils::collect_paths_for_patterns;
use pdftoolkit::{Result, ToolkitError};

/// Combine PDFs and images, remove pages, preview and print documents.
#[derive(Parser, Debug)]
#[command(name = "pdftoolkit")]
#[command(version)]
#[command(about = "Combine PDFs and images, remove pages, preview and print documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (-v for details, -vv for debug logs)
    ///
    /// `RUST_LOG` overrides the log filter chosen here.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Combine PDFs and images into one PDF, in the order given
    ///
    /// Every page of every PDF is kept; each image becomes one page sized
    /// to the image.
    ///
    /// Examples:
    ///   pdftoolkit combine report.pdf scan.png -o combined.pdf
    ///   pdftoolkit combine 'chapters/*.pdf' -o book.pdf
    Combine(CombineArgs),

    /// Write a copy of a PDF without the selected pages
    ///
    /// Examples:
    ///   pdftoolkit remove doc.pdf --pages 2,4 -o trimmed.pdf
    ///   pdftoolkit remove doc.pdf --pages 10-20 -o short.pdf
    Remove(RemoveArgs),

    /// Render every page to a PNG file
    Thumbnails(ThumbnailArgs),

    /// Load a document page by page and report the layout
    View(ViewArgs),

    /// Render a document onto paper-sized pages of a print-ready PDF
    Print(PrintArgs),

    /// Show page counts and sizes of sources
    Info(InfoArgs),
}

/// Output overwrite flags shared by the writing subcommands.
#[derive(Args, Debug, Clone, Copy)]
pub struct OverwriteArgs {
    /// Overwrite an existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite an existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,
}

impl OverwriteArgs {
    pub fn mode(&self) -> OverwriteMode {
        OverwriteMode::from_flags(self.force, self.no_clobber)
    }
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Sources to combine (PDF, PNG, JPEG, BMP, GIF), glob patterns allowed
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path (`.pdf` is appended if missing)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Validate the sources and show the plan without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not retry with PDFium when lopdf fails
    #[arg(long)]
    pub no_fallback: bool,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Source PDF
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Pages to remove, 1-based (e.g. "2,4-6"); "none" copies every page
    #[arg(short, long, value_name = "PAGES")]
    pub pages: Option<String>,

    /// Output PDF file path (`.pdf` is appended if missing)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Allow removing every page, writing an empty document
    #[arg(long)]
    pub allow_empty: bool,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,
}

/// Render parameter flags shared by the rendering subcommands.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Rotate pages clockwise by this many degrees
    #[arg(long, value_name = "DEGREES", default_value = "0")]
    #[arg(value_parser = ["0", "90", "180", "270"])]
    pub rotate: String,
}

impl RenderArgs {
    pub fn params(&self, scale: f32) -> Result<RenderParams> {
        RenderParams::new(scale, self.rotation()?)
    }

    fn rotation(&self) -> Result<Rotation> {
        parse_rotation(&self.rotate)
    }
}

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Sources to render, glob patterns allowed
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Directory receiving one PNG per page
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Scale factor (1.0 renders at 72 DPI)
    #[arg(long, default_value_t = pdftoolkit::config::DEFAULT_THUMBNAIL_SCALE)]
    pub scale: f32,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Number of parallel render jobs for image sources (default: CPU cores)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Skip pages that fail to render instead of stopping
    #[arg(long, conflicts_with = "retries")]
    pub skip_failed: bool,

    /// Retry a failing page this many times before stopping
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Document to view (PDF or image)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Zoom factor
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f32,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Jump to this page once loaded
    #[arg(long, value_name = "N", conflicts_with = "scroll")]
    pub page: Option<usize>,

    /// Scroll to this offset (in pixels) once loaded
    #[arg(long, value_name = "PIXELS")]
    pub scroll: Option<u32>,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Document to print (PDF or image)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Print-ready PDF to write (`.pdf` is appended if missing)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Paper size: a4, letter, or WIDTHxHEIGHT in points
    #[arg(long, default_value = "a4")]
    pub paper: String,

    /// Margin on every side, in points
    #[arg(long, default_value_t = 18.0)]
    pub margin: f32,

    /// Render scale; higher values give sharper output
    #[arg(long, default_value_t = 2.0)]
    pub scale: f32,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Sources to inspect, glob patterns allowed
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl TryFrom<&CombineArgs> for CombineConfig {
    type Error = ToolkitError;

    fn try_from(args: &CombineArgs) -> Result<Self> {
        let config = CombineConfig {
            inputs: collect_paths_for_patterns(&args.inputs)?,
            output: args.output.clone(),
            dry_run: args.dry_run,
            overwrite_mode: args.overwrite.mode(),
            no_fallback: args.no_fallback,
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&RemoveArgs> for RemoveConfig {
    type Error = ToolkitError;

    fn try_from(args: &RemoveArgs) -> Result<Self> {
        let selection = args
            .pages
            .as_deref()
            .map(str::parse::<PageSelection>)
            .transpose()?;

        let config = RemoveConfig {
            input: args.input.clone(),
            output: args.output.clone(),
            selection,
            allow_empty: args.allow_empty,
            overwrite_mode: args.overwrite.mode(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&ThumbnailArgs> for ThumbnailConfig {
    type Error = ToolkitError;

    fn try_from(args: &ThumbnailArgs) -> Result<Self> {
        if args.jobs == Some(0) {
            return Err(ToolkitError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        let failure_policy = match (args.skip_failed, args.retries) {
            (true, _) => RenderFailurePolicy::Skip,
            (false, Some(attempts)) => RenderFailurePolicy::Retry { attempts },
            (false, None) => RenderFailurePolicy::Abort,
        };

        Ok(ThumbnailConfig {
            inputs: collect_paths_for_patterns(&args.inputs)?,
            out_dir: args.out_dir.clone(),
            params: args.render.params(args.scale)?,
            jobs: args.jobs,
            failure_policy,
        })
    }
}

impl TryFrom<&ViewArgs> for ViewerConfig {
    type Error = ToolkitError;

    fn try_from(args: &ViewArgs) -> Result<Self> {
        let config = ViewerConfig {
            initial: args.render.params(args.zoom)?,
            ..ViewerConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&PrintArgs> for PrintConfig {
    type Error = ToolkitError;

    fn try_from(args: &PrintArgs) -> Result<Self> {
        let config = PrintConfig {
            input: args.input.clone(),
            output: args.output.clone(),
            paper: args.paper.parse::<PaperSize>()?,
            margin: args.margin,
            params: args.render.params(args.scale)?,
            overwrite_mode: args.overwrite.mode(),
        };
        pdftoolkit::print::printable_area(config.paper, config.margin)?;
        Ok(config)
    }
}
