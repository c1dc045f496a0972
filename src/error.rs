//! Error types for pdftoolkit.
//!
//! Errors fall into three groups:
//!
//! - **User-input errors**: not enough sources, no page selection, invalid
//!   render parameters. The operation is refused and nothing changes.
//! - **Library and I/O errors**: a source fails to load, a page fails to
//!   render, a file cannot be written.
//! - **Assembly errors**: every combine strategy failed.

use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Result type alias for pdftoolkit operations.
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// One failed attempt of an assembly strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    /// Name of the strategy that failed.
    pub strategy: &'static str,
    /// Error message reported by the strategy.
    pub message: String,
}

/// Main error type for pdftoolkit operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolkitError {
    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    #[error("Cannot access file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input path is not a regular file.
    #[error("Not a file: {}", path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Input is neither a PDF nor a supported raster image.
    #[error(
        "Unsupported source: {}\n  Expected a PDF or a PNG, JPEG, BMP or GIF image",
        path.display()
    )]
    UnsupportedSource {
        /// Path to the unsupported file.
        path: PathBuf,
    },

    /// Failed to load a PDF file.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to decode an image source.
    #[error("Failed to load image: {}\n  Reason: {reason}", path.display())]
    FailedToLoadImage {
        /// Path to the image file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF file is corrupted or has an invalid structure.
    #[error("Corrupted or invalid PDF: {}\n  Details: {details}", path.display())]
    CorruptedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// PDF file is encrypted and cannot be processed.
    #[error(
        "PDF is encrypted and cannot be processed: {}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        path.display()
    )]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// Fewer sources than the combine flow requires.
    #[error("Need at least {required} sources to combine, got {found}")]
    NotEnoughSources {
        /// Minimum number of sources.
        required: usize,
        /// Number of sources provided.
        found: usize,
    },

    /// Page removal was requested without any page selection.
    #[error("No pages selected for removal\n  Hint: Select pages to remove, e.g. --pages 2,4")]
    NoPageSelection,

    /// The page selection refers to pages outside the document.
    #[error(
        "Invalid page selection '{selection}' for PDF: {}\n  \
         PDF has {total_pages} page(s). Page numbers must be between 1 and {total_pages}",
        path.display()
    )]
    InvalidPageSelection {
        /// Path to the PDF file.
        path: PathBuf,
        /// Requested selection.
        selection: String,
        /// Total pages in the PDF.
        total_pages: usize,
    },

    /// The selection would remove every page of the document.
    #[error(
        "Removing all {total_pages} page(s) of {} would produce an empty document\n  \
         Use --allow-empty to write it anyway",
        path.display()
    )]
    WouldRemoveAllPages {
        /// Path to the PDF file.
        path: PathBuf,
        /// Total pages in the PDF.
        total_pages: usize,
    },

    /// Scale or rotation outside the accepted values.
    #[error("Invalid render parameters: {message}")]
    InvalidRenderParams {
        /// What is wrong with the parameters.
        message: String,
    },

    /// PDFium could not be bound.
    #[error("PDF renderer unavailable: {reason}\n  Hint: set PDFTOOLKIT_PDFIUM_DIR to the directory holding the PDFium library")]
    RendererUnavailable {
        /// Binding error.
        reason: String,
    },

    /// Rendering a single page failed.
    #[error("Failed to render page {page}: {reason}")]
    RenderFailed {
        /// 1-based page number.
        page: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// Every assembly strategy failed.
    #[error("Combine failed: {}", format_attempts(attempts))]
    AssemblyFailed {
        /// Every attempt, in the order it was made.
        attempts: Vec<StrategyFailure>,
    },

    /// A page tree could not be rebuilt.
    #[error("Page tree operation failed: {reason}")]
    PageTree {
        /// Description of what went wrong.
        reason: String,
    },

    /// The viewer received a request that its current phase does not allow.
    #[error("Viewer not ready: {message}")]
    ViewerNotReady {
        /// What was requested.
        message: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

fn format_attempts(attempts: &[StrategyFailure]) -> String {
    if attempts.is_empty() {
        return "no strategy was configured".to_string();
    }

    attempts
        .iter()
        .map(|attempt| format!("\n  {}: {}", attempt.strategy, attempt.message))
        .collect()
}

impl From<lopdf::Error> for ToolkitError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for ToolkitError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(format!("{err:#}"))
    }
}

impl From<image::ImageError> for ToolkitError {
    fn from(err: image::ImageError) -> Self {
        Self::other(err.to_string())
    }
}

impl ToolkitError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a FailedToLoadImage error.
    pub fn failed_to_load_image(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadImage {
            path,
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: PathBuf) -> Self {
        Self::EncryptedPdf { path }
    }

    /// Create a RenderFailed error.
    pub fn render_failed(page: usize, reason: impl Into<String>) -> Self {
        Self::RenderFailed {
            page,
            reason: reason.into(),
        }
    }

    /// Create a PageTree error.
    pub fn page_tree(reason: impl Into<String>) -> Self {
        Self::PageTree {
            reason: reason.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidRenderParams error.
    pub fn invalid_render_params(message: impl Into<String>) -> Self {
        Self::InvalidRenderParams {
            message: message.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error was caused by user input rather than by a file or
    /// library. These are refused up front and leave all state unchanged.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughSources { .. }
                | Self::NoPageSelection
                | Self::InvalidPageSelection { .. }
                | Self::WouldRemoveAllPages { .. }
                | Self::InvalidRenderParams { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Check if this error is recoverable (a later strategy or page may
    /// still succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FailedToLoadPdf { .. }
                | Self::FailedToLoadImage { .. }
                | Self::CorruptedPdf { .. }
                | Self::RenderFailed { .. }
                | Self::PageTree { .. }
                | Self::Other { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::UnsupportedSource { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::FailedToLoadImage { .. } => 3,
            Self::CorruptedPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::NotEnoughSources { .. } => 1,
            Self::NoPageSelection => 1,
            Self::InvalidPageSelection { .. } => 1,
            Self::WouldRemoveAllPages { .. } => 1,
            Self::InvalidRenderParams { .. } => 1,
            Self::RendererUnavailable { .. } => 7,
            Self::RenderFailed { .. } => 7,
            Self::AssemblyFailed { .. } => 6,
            Self::PageTree { .. } => 6,
            Self::ViewerNotReady { .. } => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
