//! pdftoolkit - combine PDFs and images, remove pages, preview and print.

mod cli;

use clap::Parser;
use pdfium_render::prelude::Pdfium;
use serde::Serialize;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::debug;

use crate::cli::{CombineArgs, Command, InfoArgs, PrintArgs, RemoveArgs, ThumbnailArgs, ViewArgs};
use pdftoolkit::assemble::{Assembler, PdfiumStrategy};
use pdftoolkit::config::{
    CombineConfig, OverwriteMode, PrintConfig, RemoveConfig, ThumbnailConfig, ViewerConfig,
};
use pdftoolkit::io::writer::ensure_pdf_extension;
use pdftoolkit::io::{SourceFile, SourceKind};
use pdftoolkit::output::{
    OutputFormatter, ProgressBar, ProgressStyle, display_assembly_report, display_removal_report,
    display_validation_summary,
};
use pdftoolkit::print::{PdfPrintSink, print_document};
use pdftoolkit::render::parallel::render_parallel;
use pdftoolkit::render::pdfium::{PdfiumDocument, bind_pdfium};
use pdftoolkit::render::raster::RasterDocument;
use pdftoolkit::render::stream::PageStream;
use pdftoolkit::render::{PageRenderer, RenderedPage};
use pdftoolkit::session::CombineList;
use pdftoolkit::split::PageRemover;
use pdftoolkit::utils::collect_paths_for_patterns;
use pdftoolkit::validation::Validator;
use pdftoolkit::viewer::Viewer;
use pdftoolkit::{Result, ToolkitError};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    if let Err(err) = pdftoolkit::telemetry::init(cli.verbose) {
        eprintln!("Warning: {err}");
    }

    let formatter = OutputFormatter::new(cli.quiet, cli.verbose > 0);

    if let Err(err) = run(cli.command, &formatter).await {
        formatter.error(&format!("Error: {err}"));
        process::exit(err.exit_code());
    }
}

async fn run(command: Command, formatter: &OutputFormatter) -> Result<()> {
    match command {
        Command::Combine(args) => combine(&args, formatter).await,
        Command::Remove(args) => remove(&args, formatter).await,
        Command::Thumbnails(args) => thumbnails(&args, formatter).await,
        Command::View(args) => view(&args, formatter),
        Command::Print(args) => print(&args, formatter).await,
        Command::Info(args) => info(&args, formatter).await,
    }
}

async fn combine(args: &CombineArgs, formatter: &OutputFormatter) -> Result<()> {
    let config = CombineConfig::try_from(args)?;

    let mut list = CombineList::new();
    let added = list.add_all(config.inputs.iter().cloned());
    if added < config.inputs.len() {
        formatter.warning(&format!(
            "Ignored {} duplicate source(s)",
            config.inputs.len() - added
        ));
    }
    list.ensure_combinable()?;

    if !args.json {
        formatter.info("Validating sources...");
    }
    let validator = Validator::new();
    let summary = validator.validate_files(list.paths(), false).await?;
    if !args.json {
        display_validation_summary(formatter, &summary);
    }

    let output = ensure_pdf_extension(&config.output);
    validator
        .validate_output(&output, list.paths(), config.overwrite_mode)
        .await?;

    if config.dry_run {
        if args.json {
            print_json(&summary)?;
        } else {
            formatter.success("Dry run completed successfully");
            formatter.info(&format!("  Output would be: {}", output.display()));
        }
        return Ok(());
    }

    handle_output_overwrite(&output, config.overwrite_mode, formatter)?;

    let sources = list.sources()?;
    let pdfium = if config.no_fallback {
        None
    } else {
        bind_pdfium()
            .inspect_err(|err| debug!(error = %err, "PDFium fallback unavailable"))
            .ok()
    };

    let mut assembler = Assembler::lopdf_only();
    if let Some(pdfium) = &pdfium {
        assembler = assembler.with_strategy(PdfiumStrategy::new(pdfium));
    }

    let report = assembler.assemble(&sources, &output)?;
    if args.json {
        print_json(&report)?;
    } else {
        display_assembly_report(formatter, &report);
    }

    Ok(())
}

async fn remove(args: &RemoveArgs, formatter: &OutputFormatter) -> Result<()> {
    let config = RemoveConfig::try_from(args)?;
    let output = ensure_pdf_extension(&config.output);

    Validator::new()
        .validate_output(&output, std::slice::from_ref(&config.input), config.overwrite_mode)
        .await?;
    handle_output_overwrite(&output, config.overwrite_mode, formatter)?;

    let report = PageRemover::new()
        .allow_empty(config.allow_empty)
        .remove_selection(&config.input, config.selection.as_ref(), &output)?;

    display_removal_report(formatter, &report);
    Ok(())
}

async fn thumbnails(args: &ThumbnailArgs, formatter: &OutputFormatter) -> Result<()> {
    let config = ThumbnailConfig::try_from(args)?;
    tokio::fs::create_dir_all(&config.out_dir).await?;

    let mut pdfium: Option<Pdfium> = None;
    let mut written = 0;

    let stems = thumbnail_stems(&config.inputs);
    for (input, stem) in config.inputs.iter().zip(&stems) {
        let source = SourceFile::detect(input)?;

        match source.kind {
            SourceKind::Pdf => {
                if pdfium.is_none() {
                    pdfium = Some(bind_pdfium()?);
                }
                let library = pdfium.as_ref().ok_or_else(|| ToolkitError::RendererUnavailable {
                    reason: "PDFium is not bound".to_string(),
                })?;

                let document = PdfiumDocument::open(library, input)?;
                written += write_page_thumbnails(&document, &config, input, stem, formatter)?;
            }
            SourceKind::Image(_) => {
                let document = Arc::new(RasterDocument::open(input)?);
                let jobs = config.effective_jobs();
                for page in render_parallel(document, config.params, jobs).await {
                    save_thumbnail(&config.out_dir, stem, &page?)?;
                    written += 1;
                }
            }
        }
    }

    formatter.success(&format!(
        "Wrote {written} thumbnail(s) to {}",
        config.out_dir.display()
    ));
    Ok(())
}

fn write_page_thumbnails<R: PageRenderer + ?Sized>(
    renderer: &R,
    config: &ThumbnailConfig,
    input: &Path,
    stem: &str,
    formatter: &OutputFormatter,
) -> Result<usize> {
    let mut progress = new_progress(formatter, renderer.page_count());
    progress.set_message(display_name(input));

    let mut stream = PageStream::with_policy(renderer, config.params, config.failure_policy);
    let mut written = 0;
    for page in stream.by_ref() {
        save_thumbnail(&config.out_dir, stem, &page?)?;
        written += 1;
        progress.increment();
    }
    progress.finish();

    if !stream.skipped().is_empty() {
        formatter.warning(&format!(
            "Skipped page(s) {:?} of {}",
            stream.skipped(),
            input.display()
        ));
    }

    Ok(written)
}

/// One file name stem per input, unique across the batch.
///
/// Inputs sharing a stem (`a/report.pdf`, `b/report.pdf`) are prefixed with
/// their 1-based position in the batch.
fn thumbnail_stems(inputs: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = inputs
        .iter()
        .map(|input| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "page".to_string())
        })
        .collect();

    let mut taken = HashSet::new();
    stems
        .iter()
        .enumerate()
        .map(|(index, stem)| {
            let repeated = stems.iter().filter(|other| *other == stem).count() > 1;
            let mut name = if repeated {
                format!("{}-{stem}", index + 1)
            } else {
                stem.clone()
            };
            while !taken.insert(name.clone()) {
                name.push('_');
            }
            name
        })
        .collect()
}

/// `<out_dir>/<stem>-<page, three digits>.png`
fn thumbnail_path(out_dir: &Path, stem: &str, page_number: usize) -> PathBuf {
    out_dir.join(format!("{stem}-{page_number:03}.png"))
}

fn save_thumbnail(out_dir: &Path, stem: &str, page: &RenderedPage) -> Result<()> {
    let path = thumbnail_path(out_dir, stem, page.page_number);
    page.bitmap.save(&path)?;
    debug!(path = %path.display(), "wrote thumbnail");
    Ok(())
}

fn view(args: &ViewArgs, formatter: &OutputFormatter) -> Result<()> {
    let config = ViewerConfig::try_from(args)?;
    let source = SourceFile::detect(&args.input)?;

    match source.kind {
        SourceKind::Pdf => {
            let pdfium = bind_pdfium()?;
            let document = PdfiumDocument::open(&pdfium, &args.input)?;
            view_document(&document, config, args, formatter)
        }
        SourceKind::Image(_) => {
            let document = RasterDocument::open(&args.input)?;
            view_document(&document, config, args, formatter)
        }
    }
}

fn view_document<R: PageRenderer + ?Sized>(
    renderer: &R,
    config: ViewerConfig,
    args: &ViewArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut progress = new_progress(formatter, renderer.page_count());
    progress.set_message("Loading");

    let mut viewer = Viewer::open(renderer, Vec::<RenderedPage>::new(), config)?;
    viewer.load_all(|| progress.increment())?;
    progress.finish();

    let state = viewer.state();
    formatter.info(&format!(
        "{} page(s) at {:.0}% zoom, rotated {}°, {} px tall",
        state.page_count(),
        state.params().scale() * 100.0,
        state.params().rotation().as_degrees(),
        state.content_height()
    ));
    for slot in state.slots() {
        formatter.detail(
            &format!("Page {}", slot.page_number),
            &format!("{}x{} at y={}", slot.width, slot.height, slot.top),
        );
    }

    if let Some(page) = args.page {
        let offset = viewer.go_to_page(page)?;
        formatter.info(&format!("Page {page} starts at offset {offset}"));
    }

    if let Some(offset) = args.scroll {
        let page = viewer.on_scroll(offset);
        formatter.info(&format!("Offset {offset} shows page {page}"));
    }

    Ok(())
}

async fn print(args: &PrintArgs, formatter: &OutputFormatter) -> Result<()> {
    let config = PrintConfig::try_from(args)?;
    let output = ensure_pdf_extension(&config.output);

    Validator::new()
        .validate_output(&output, std::slice::from_ref(&config.input), config.overwrite_mode)
        .await?;
    handle_output_overwrite(&output, config.overwrite_mode, formatter)?;

    let source = SourceFile::detect(&config.input)?;
    let sheets = match source.kind {
        SourceKind::Pdf => {
            let pdfium = bind_pdfium()?;
            let document = PdfiumDocument::open(&pdfium, &config.input)?;
            print_to_pdf(&document, &config, &output)?
        }
        SourceKind::Image(_) => {
            let document = RasterDocument::open(&config.input)?;
            print_to_pdf(&document, &config, &output)?
        }
    };

    formatter.success(&format!(
        "Printed {sheets} page(s) on {} to {}",
        config.paper,
        output.display()
    ));
    Ok(())
}

fn print_to_pdf<R: PageRenderer + ?Sized>(
    renderer: &R,
    config: &PrintConfig,
    output: &Path,
) -> Result<usize> {
    let mut stream = PageStream::new(renderer, config.params);
    let mut sink = PdfPrintSink::new(output);
    print_document(&mut stream, &mut sink, config.paper, config.margin)
}

async fn info(args: &InfoArgs, formatter: &OutputFormatter) -> Result<()> {
    let paths = collect_paths_for_patterns(&args.inputs)?;
    let summary = Validator::allowing_empty()
        .validate_files(&paths, true)
        .await?;

    if args.json {
        return print_json(&summary);
    }

    for (index, result) in summary.results.iter().enumerate() {
        let size = result
            .page_dimensions
            .map(|(w, h)| format!(", {w:.0}x{h:.0}"))
            .unwrap_or_default();
        formatter.list_item(
            index + 1,
            &format!(
                "{}: {}, {} page(s){size}",
                result.path.display(),
                result.kind,
                result.page_count
            ),
        );
    }
    display_validation_summary(formatter, &summary);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ToolkitError::other(format!("Failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

fn new_progress(formatter: &OutputFormatter, total: usize) -> ProgressBar {
    if formatter.should_print() {
        ProgressBar::new(total, ProgressStyle::Bar)
    } else {
        ProgressBar::disabled()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Handle output file overwrite scenarios.
fn handle_output_overwrite(
    output: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !output.exists() {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(ToolkitError::output_exists(output.to_path_buf())),
        OverwriteMode::Prompt => {
            if formatter.is_quiet() {
                return Err(ToolkitError::output_exists(output.to_path_buf()));
            }

            formatter.warning(&format!("Output file already exists: {}", output.display()));
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| ToolkitError::other(format!("Failed to read input: {err}")))?;

            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(ToolkitError::Cancelled),
            }
        }
    }
}
