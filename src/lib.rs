//! pdftoolkit: combine PDFs and images, remove pages, and preview or print
//! documents page by page.
//!
//! Structural work (merging, page removal, print output) is done with
//! `lopdf`; rasterisation is delegated to PDFium through `pdfium-render`,
//! bound at runtime. Everything a front end needs to keep as state (the
//! combine list, the split selection, the incremental loader and the viewer
//! state machine) is modelled here without any UI toolkit.
//!
//! # Examples
//!
//! ```no_run
//! use pdftoolkit::assemble::Assembler;
//! use pdftoolkit::session::CombineList;
//! use std::path::Path;
//!
//! # fn example() -> pdftoolkit::Result<()> {
//! let mut list = CombineList::new();
//! list.add("report.pdf");
//! list.add("signature.png");
//! list.ensure_combinable()?;
//!
//! let report = Assembler::lopdf_only().assemble(&list.sources()?, Path::new("combined"))?;
//! println!("{} pages written to {}", report.page_count, report.output.display());
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod io;
pub mod loader;
pub mod output;
pub mod print;
pub mod render;
pub mod session;
pub mod split;
pub mod telemetry;
pub mod utils;
pub mod validation;
pub mod viewer;

pub use error::{Result, StrategyFailure, ToolkitError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
