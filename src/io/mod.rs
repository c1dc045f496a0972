//! Reading sources and writing PDFs.

pub mod reader;
pub mod source;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use source::{SourceFile, SourceKind};
pub use writer::{PdfWriter, WriteStatistics, ensure_pdf_extension};
