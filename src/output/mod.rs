//! User-facing output for the command line.
//!
//! Diagnostics go through `tracing`; this module is for what the user asked
//! to see: status lines, summaries and progress.

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::{ProgressBar, ProgressStyle};

use crate::assemble::AssemblyReport;
use crate::io::writer::format_file_size;
use crate::split::RemovalReport;
use crate::validation::ValidationSummary;

/// Display validation summary to the user.
pub fn display_validation_summary(formatter: &OutputFormatter, summary: &ValidationSummary) {
    if summary.files_failed > 0 {
        formatter.warning(&format!(
            "{} file(s) failed validation",
            summary.files_failed
        ));
    }

    formatter.info(&format!(
        "Validated {} file(s): {} pages, {}",
        summary.files_validated,
        summary.total_pages,
        summary.format_total_size()
    ));

    for (index, result) in summary.results.iter().enumerate() {
        formatter.detail(
            &format!("{}", index + 1),
            &format!(
                "{} ({}, {} page(s), {})",
                result.path.display(),
                result.kind,
                result.page_count,
                format_file_size(result.file_size)
            ),
        );
    }
}

/// Display the outcome of a combine.
pub fn display_assembly_report(formatter: &OutputFormatter, report: &AssemblyReport) {
    for failure in &report.fallbacks {
        formatter.warning(&format!(
            "{} strategy failed: {}",
            failure.strategy, failure.message
        ));
    }

    formatter.success(&format!(
        "Combined {} source(s) into {} ({} pages)",
        report.sources,
        report.output.display(),
        report.page_count
    ));
    formatter.detail("Strategy", report.strategy);
    formatter.detail("Time", &format!("{:.2}s", report.elapsed.as_secs_f64()));
}

/// Display the outcome of a page removal.
pub fn display_removal_report(formatter: &OutputFormatter, report: &RemovalReport) {
    formatter.success(&format!(
        "Removed {} of {} page(s), wrote {} ({} pages)",
        report.removed(),
        report.original_pages,
        report.output.display(),
        report.kept.len()
    ));

    let kept = report
        .kept
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    formatter.detail("Kept pages", &kept);
}
