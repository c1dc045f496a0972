//! Source classification.
//!
//! Every input is either a PDF or a raster image. The extension decides
//! first; files with an unknown or missing extension are sniffed.

use image::ImageFormat;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolkitError};

/// Bytes read when sniffing a file's content.
const SNIFF_LEN: usize = 32;

/// What kind of document a source is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A PDF document.
    Pdf,
    /// A raster image, contributing one page.
    Image(ImageFormat),
}

impl SourceKind {
    /// Classify by file extension (case-insensitive).
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == "pdf" {
            return Some(Self::Pdf);
        }

        match ImageFormat::from_extension(&ext)? {
            format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Gif) => {
                Some(Self::Image(format))
            }
            _ => None,
        }
    }

    /// Classify by leading bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"%PDF-") {
            return Some(Self::Pdf);
        }

        match image::guess_format(header).ok()? {
            format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Gif) => {
                Some(Self::Image(format))
            }
            _ => None,
        }
    }

    /// Whether this is a PDF.
    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("PDF"),
            Self::Image(format) => write!(f, "{format:?} image"),
        }
    }
}

impl Serialize for SourceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An input file and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceFile {
    /// Path to the file.
    pub path: PathBuf,
    /// Detected kind.
    pub kind: SourceKind,
}

impl SourceFile {
    /// Create a source with a known kind.
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Classify an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::FileNotFound`] if the file does not exist and
    /// [`ToolkitError::UnsupportedSource`] if it is neither a PDF nor a
    /// supported image.
    pub fn detect(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Err(ToolkitError::file_not_found(path));
        }

        if let Some(kind) = SourceKind::from_extension(&path) {
            return Ok(Self { path, kind });
        }

        let mut header = Vec::with_capacity(SNIFF_LEN);
        File::open(&path)
            .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut header))
            .map_err(|source| ToolkitError::FileNotAccessible {
                path: path.clone(),
                source,
            })?;

        match SourceKind::sniff(&header) {
            Some(kind) => Ok(Self { path, kind }),
            None => Err(ToolkitError::UnsupportedSource { path }),
        }
    }

    /// Whether this source is a PDF.
    pub fn is_pdf(&self) -> bool {
        self.kind.is_pdf()
    }

    /// File name for display.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("doc.pdf", Some(SourceKind::Pdf))]
    #[case("DOC.PDF", Some(SourceKind::Pdf))]
    #[case("scan.png", Some(SourceKind::Image(ImageFormat::Png)))]
    #[case("photo.jpeg", Some(SourceKind::Image(ImageFormat::Jpeg)))]
    #[case("photo.JPG", Some(SourceKind::Image(ImageFormat::Jpeg)))]
    #[case("icon.bmp", Some(SourceKind::Image(ImageFormat::Bmp)))]
    #[case("anim.gif", Some(SourceKind::Image(ImageFormat::Gif)))]
    #[case("notes.txt", None)]
    #[case("picture.tiff", None)]
    #[case("noext", None)]
    fn test_kind_from_extension(#[case] name: &str, #[case] expected: Option<SourceKind>) {
        assert_eq!(SourceKind::from_extension(Path::new(name)), expected);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(SourceKind::sniff(b"%PDF-1.7\n"), Some(SourceKind::Pdf));
        assert_eq!(
            SourceKind::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\0"),
            Some(SourceKind::Image(ImageFormat::Png))
        );
        assert_eq!(SourceKind::sniff(b"hello"), None);
    }

    #[test]
    fn test_detect_sniffs_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, b"%PDF-1.5\n%rest").unwrap();

        let source = SourceFile::detect(&path).unwrap();
        assert_eq!(source.kind, SourceKind::Pdf);
        assert_eq!(source.display_name(), "upload.bin");
    }

    #[test]
    fn test_detect_errors() {
        assert!(matches!(
            SourceFile::detect("/nonexistent/file.pdf"),
            Err(ToolkitError::FileNotFound { .. })
        ));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            SourceFile::detect(&path),
            Err(ToolkitError::UnsupportedSource { .. })
        ));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SourceKind::Pdf.to_string(), "PDF");
        assert_eq!(SourceKind::Image(ImageFormat::Png).to_string(), "Png image");
    }
}
