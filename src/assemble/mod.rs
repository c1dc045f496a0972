//! Document assembly: many sources in, one PDF out.
//!
//! Assembly is tried with each configured [`AssemblyStrategy`] in turn. A
//! strategy re-reads every source from disk, so a failed attempt leaves
//! nothing behind that the next one depends on. The assembler only fails when
//! every strategy has failed, and then reports all of them.

pub mod image_page;
pub mod lopdf_backend;
pub mod pdfium_backend;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::{Result, StrategyFailure, ToolkitError};
use crate::io::SourceFile;
use crate::io::writer::ensure_pdf_extension;

pub use lopdf_backend::LopdfStrategy;
pub use pdfium_backend::PdfiumStrategy;

/// One way of producing the combined PDF.
pub trait AssemblyStrategy {
    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Write `sources`, in order, to `output`. Returns the page count.
    fn assemble(&self, sources: &[SourceFile], output: &Path) -> Result<usize>;
}

/// Outcome of a successful assembly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyReport {
    /// Strategy that produced the output.
    pub strategy: &'static str,

    /// Path actually written (with `.pdf` enforced).
    pub output: PathBuf,

    /// Pages in the output.
    pub page_count: usize,

    /// Number of sources combined.
    pub sources: usize,

    /// Strategies that failed before the successful one.
    pub fallbacks: Vec<StrategyFailure>,

    /// Wall-clock time of the whole assembly.
    pub elapsed: Duration,
}

/// Ordered list of strategies.
#[derive(Default)]
pub struct Assembler<'a> {
    strategies: Vec<Box<dyn AssemblyStrategy + 'a>>,
}

impl<'a> Assembler<'a> {
    /// Assembler with no strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler that only uses lopdf.
    pub fn lopdf_only() -> Self {
        Self::new().with_strategy(LopdfStrategy::new())
    }

    /// Append a strategy to try after the existing ones.
    pub fn with_strategy<S: AssemblyStrategy + 'a>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Combine `sources` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotEnoughSources`] for an empty source list and
    /// [`ToolkitError::AssemblyFailed`] when every strategy fails.
    pub fn assemble(&self, sources: &[SourceFile], output: &Path) -> Result<AssemblyReport> {
        if sources.is_empty() {
            return Err(ToolkitError::NotEnoughSources {
                required: 1,
                found: 0,
            });
        }

        let start = Instant::now();
        let output = ensure_pdf_extension(output);
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.assemble(sources, &output) {
                Ok(page_count) => {
                    info!(
                        strategy = strategy.name(),
                        pages = page_count,
                        output = %output.display(),
                        "combined {} source(s)",
                        sources.len()
                    );
                    return Ok(AssemblyReport {
                        strategy: strategy.name(),
                        output,
                        page_count,
                        sources: sources.len(),
                        fallbacks: failures,
                        elapsed: start.elapsed(),
                    });
                }
                Err(err) => {
                    warn!(strategy = strategy.name(), error = %err, "assembly strategy failed");
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Err(ToolkitError::AssemblyFailed { attempts: failures })
    }
}
