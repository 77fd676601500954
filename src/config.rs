//! Configuration types for PDF-to-JPEG conversion.
//!
//! The conversion constants (page limit, raster scale, JPEG quality,
//! download pacing) are fixed for end users: the CLI does not expose them.
//! [`ConversionConfig`] still carries them so library callers and tests can
//! construct a pipeline with, say, zero pacing, without touching global state.

use crate::error::Pdf2JpgError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Maximum number of pages a document may have.
pub const MAX_PAGES: usize = 20;

/// Raster scale relative to the PDF's native 72-DPI unit (150 DPI output).
pub const DPI_SCALE: f32 = 150.0 / 72.0;

/// JPEG quality on the 1–100 scale (0.85 on the unit scale).
pub const JPEG_QUALITY: u8 = 85;

/// Delay between successive file saves in a multi-page download.
pub const DOWNLOAD_PACING: Duration = Duration::from_millis(500);

/// Base name used when the input file name has no usable stem.
pub const DEFAULT_BASE_NAME: &str = "converted";

/// Configuration for a PDF-to-JPEG conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2jpg::ConversionConfig;
/// use std::time::Duration;
///
/// let config = ConversionConfig::builder()
///     .download_pacing(Duration::ZERO)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 20);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Documents with more pages than this are rejected before any page is rendered. Default: 20.
    pub max_pages: usize,

    /// Raster scale factor applied to the page's point size. Default: 150/72.
    pub dpi_scale: f32,

    /// JPEG quality, 1–100. Default: 85.
    pub jpeg_quality: u8,

    /// Pause between successive saves in [`crate::download::DownloadDispatcher::download_selected`].
    /// Default: 500 ms.
    pub download_pacing: Duration,

    /// Optional pause after each rendered page, on the worker thread. Default: zero.
    pub page_yield: Duration,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            dpi_scale: DPI_SCALE,
            jpeg_quality: JPEG_QUALITY,
            download_pacing: DOWNLOAD_PACING,
            page_yield: Duration::ZERO,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("max_pages", &self.max_pages)
            .field("dpi_scale", &self.dpi_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("download_pacing", &self.download_pacing)
            .field("page_yield", &self.page_yield)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn dpi_scale(mut self, scale: f32) -> Self {
        self.config.dpi_scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn download_pacing(mut self, pacing: Duration) -> Self {
        self.config.download_pacing = pacing;
        self
    }

    pub fn page_yield(mut self, pause: Duration) -> Self {
        self.config.page_yield = pause;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2JpgError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(Pdf2JpgError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if !(c.dpi_scale.is_finite() && c.dpi_scale > 0.0) {
            return Err(Pdf2JpgError::InvalidConfig(format!(
                "dpi_scale must be a positive number, got {}",
                c.dpi_scale
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(Pdf2JpgError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}
