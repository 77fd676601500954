//! Error types for the pdf2jpg library.
//!
//! Every failure is terminal for the current run: there is no per-page retry
//! and no partial output. [`Pdf2JpgError`] is what the library returns;
//! [`AppError`] is the `(title, message)` pair a front end shows to the user
//! for the same failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2jpg library.
#[derive(Debug, Error)]
pub enum Pdf2JpgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The selected file does not declare the PDF media type.
    #[error("'{file_name}' is not a PDF (declared type: {media_type}). Please choose a valid PDF file.")]
    UnsupportedFileType {
        file_name: String,
        media_type: String,
    },

    // ── Document errors ───────────────────────────────────────────────────
    /// PDF requires a password. Encrypted documents are not supported.
    #[error("PDF is password protected")]
    PasswordProtected,

    /// The bytes are not a well-formed PDF.
    #[error("File is not a valid PDF: {detail}")]
    InvalidDocument { detail: String },

    /// Page count exceeds the configured maximum.
    #[error("PDF has {pages} pages, the limit is {max}")]
    TooManyPages { pages: usize, max: usize },

    /// The document parsed but has no pages.
    #[error("PDF has no pages")]
    EmptyDocument,

    /// Any other load-time failure reported by the rendering engine.
    #[error("Failed to load PDF: {detail}")]
    LoadFailed { detail: String },

    /// Rasterising or encoding a page failed. The whole run is discarded.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// `load_document` was called while a document is still held.
    #[error("A document is already loaded; destroy it before loading another")]
    PipelineBusy,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output image.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, place it next to the binary, or set\n\
PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The kind of user-facing failure, independent of its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    PasswordProtected,
    InvalidDocument,
    TooManyPages,
    EmptyDocument,
    LoadFailed,
    RenderFailed,
    Other,
}

impl Pdf2JpgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Pdf2JpgError::PasswordProtected => ErrorKind::PasswordProtected,
            Pdf2JpgError::InvalidDocument { .. } => ErrorKind::InvalidDocument,
            Pdf2JpgError::TooManyPages { .. } => ErrorKind::TooManyPages,
            Pdf2JpgError::EmptyDocument => ErrorKind::EmptyDocument,
            Pdf2JpgError::LoadFailed { .. } => ErrorKind::LoadFailed,
            Pdf2JpgError::RenderFailed { .. } => ErrorKind::RenderFailed,
            _ => ErrorKind::Other,
        }
    }
}

/// User-facing description of a failed run.
///
/// Every variant of [`Pdf2JpgError`] maps to exactly one pair; the front end
/// shows it alongside a "try another file" action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub title: String,
    pub message: String,
}

impl AppError {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl From<&Pdf2JpgError> for AppError {
    fn from(err: &Pdf2JpgError) -> Self {
        match err {
            Pdf2JpgError::TooManyPages { max, .. } => AppError::new(
                "File size limit",
                format!(
                    "This PDF exceeds the {max}-page limit. Split the file or choose a smaller one."
                ),
            ),
            Pdf2JpgError::PasswordProtected => AppError::new(
                "Encrypted PDF",
                "Password-protected PDFs are not supported.",
            ),
            Pdf2JpgError::InvalidDocument { .. } => AppError::new(
                "Invalid file",
                "The file could not be read. It may be corrupted or not a valid PDF.",
            ),
            Pdf2JpgError::EmptyDocument => {
                AppError::new("Empty PDF", "This PDF does not contain any pages.")
            }
            Pdf2JpgError::RenderFailed { page, .. } => AppError::new(
                "Conversion failed",
                format!("Page {page} could not be converted. No images were kept."),
            ),
            _ => AppError::new("Error", "An unexpected error occurred."),
        }
    }
}

impl From<Pdf2JpgError> for AppError {
    fn from(err: Pdf2JpgError) -> Self {
        AppError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_pages_display() {
        let e = Pdf2JpgError::TooManyPages { pages: 35, max: 20 };
        let msg = e.to_string();
        assert!(msg.contains("35"), "got: {msg}");
        assert!(msg.contains("20"), "got: {msg}");
    }

    #[test]
    fn render_failed_display() {
        let e = Pdf2JpgError::RenderFailed {
            page: 4,
            detail: "bitmap allocation".into(),
        };
        assert!(e.to_string().contains("page 4"));
        assert!(e.to_string().contains("bitmap allocation"));
    }

    #[test]
    fn app_error_for_too_many_pages_mentions_limit() {
        let e = Pdf2JpgError::TooManyPages { pages: 21, max: 20 };
        let app = AppError::from(&e);
        assert_eq!(app.title, "File size limit");
        assert!(app.message.contains("20-page"));
    }

    #[test]
    fn app_error_for_password() {
        let app = AppError::from(Pdf2JpgError::PasswordProtected);
        assert_eq!(app.title, "Encrypted PDF");
    }

    #[test]
    fn app_error_for_load_failure_is_generic() {
        let app = AppError::from(Pdf2JpgError::LoadFailed {
            detail: "boom".into(),
        });
        assert_eq!(app.title, "Error");
        assert!(!app.message.contains("boom"));
    }

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(Pdf2JpgError::EmptyDocument.kind(), ErrorKind::EmptyDocument);
        assert_eq!(
            Pdf2JpgError::InvalidDocument { detail: String::new() }.kind(),
            ErrorKind::InvalidDocument
        );
        assert_eq!(Pdf2JpgError::PipelineBusy.kind(), ErrorKind::Other);
    }
}
