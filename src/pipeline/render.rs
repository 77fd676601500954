//! PDF rasterisation behind the [`Renderer`] / [`DocumentHandle`] seam.
//!
//! The page pipeline only needs three things from a rendering engine: parse
//! a byte buffer, report the page count, and rasterise page N at a scale
//! factor. [`PdfiumRenderer`] provides them through `pdfium-render`; tests
//! plug in in-memory fakes.
//!
//! A pdfium document borrows the bound library and is not `Send`, so a
//! renderer is built on the thread that uses it. [`RendererFactory`] is the
//! `Send + Sync` recipe the session hands to its worker thread.

use crate::error::Pdf2JpgError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A loaded, parsed document. Dropping it releases every engine resource.
pub trait DocumentHandle {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Rasterise 1-indexed `page_num` at `scale` × the page's point size.
    fn render_page(&self, page_num: usize, scale: f32) -> Result<DynamicImage, String>;
}

/// A rendering engine able to parse documents.
pub trait Renderer {
    /// Parse `bytes` into a document.
    ///
    /// Fails with [`Pdf2JpgError::PasswordProtected`],
    /// [`Pdf2JpgError::InvalidDocument`] or [`Pdf2JpgError::LoadFailed`].
    fn load<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle + 'a>, Pdf2JpgError>;
}

/// Builds a renderer on the calling thread.
pub type RendererFactory =
    Arc<dyn Fn() -> Result<Box<dyn Renderer>, Pdf2JpgError> + Send + Sync>;

/// [`Renderer`] backed by the pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to pdfium.
    ///
    /// Resolution order: `library_path`, `PDFIUM_LIB_PATH`, a library next to
    /// the working directory, then the system library.
    pub fn bind(library_path: Option<&Path>) -> Result<Self, Pdf2JpgError> {
        let bindings = match library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => match std::env::var("PDFIUM_LIB_PATH") {
                Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
                _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library()),
            },
        }
        .map_err(|e| Pdf2JpgError::PdfiumBindingFailed(format!("{:?}", e)))?;

        debug!("Bound to pdfium");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// A factory that binds pdfium on whichever thread calls it.
    pub fn factory(library_path: Option<PathBuf>) -> RendererFactory {
        Arc::new(move || -> Result<Box<dyn Renderer>, Pdf2JpgError> {
            let renderer = PdfiumRenderer::bind(library_path.as_deref())?;
            Ok(Box::new(renderer))
        })
    }
}

impl Renderer for PdfiumRenderer {
    fn load<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle + 'a>, Pdf2JpgError> {
        // An empty password: documents that need a real one fail with PasswordError.
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(map_load_error)?;

        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl DocumentHandle for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, page_num: usize, scale: f32) -> Result<DynamicImage, String> {
        let index = page_num
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| format!("page {page_num} is not addressable"))?;

        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|e| format!("{:?}", e))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| format!("{:?}", e))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Classify a pdfium load failure.
fn map_load_error(e: PdfiumError) -> Pdf2JpgError {
    match e {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Pdf2JpgError::PasswordProtected
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError) => {
            Pdf2JpgError::InvalidDocument {
                detail: "not in PDF format or corrupted".to_string(),
            }
        }
        other => {
            let detail = format!("{:?}", other);
            if detail.contains("Password") || detail.contains("password") {
                Pdf2JpgError::PasswordProtected
            } else {
                Pdf2JpgError::LoadFailed { detail }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_error_maps_to_password_protected() {
        let e = PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError);
        assert!(matches!(map_load_error(e), Pdf2JpgError::PasswordProtected));
    }

    #[test]
    fn format_error_maps_to_invalid_document() {
        let e = PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError);
        assert!(matches!(
            map_load_error(e),
            Pdf2JpgError::InvalidDocument { .. }
        ));
    }

    #[test]
    fn other_errors_map_to_load_failed() {
        let e = PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FileError);
        assert!(matches!(map_load_error(e), Pdf2JpgError::LoadFailed { .. }));
    }
}
