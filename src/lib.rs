//! # pdf2jpg
//!
//! Convert a PDF of up to 20 pages into one JPEG per page, let the user pick
//! which pages to keep, and save them as `{name}_p01.jpg`, `{name}_p02.jpg`, …
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     declared type must be application/pdf
//!  ├─ 2. Load      parse via pdfium; reject > 20 pages or 0 pages
//!  ├─ 3. Render    page 1..=n at 150 DPI (CPU-bound, spawn_blocking)
//!  ├─ 4. Encode    JPEG, quality 85 → image handle
//!  ├─ 5. Select    every page starts selected; toggle per page or all
//!  └─ 6. Download  selected pages in page order, 500 ms apart
//! ```
//!
//! A run is all-or-nothing: cancellation or a failing page discards every
//! page of that run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2jpg::{convert_to_dir, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let stats = convert_to_dir("report.pdf", "out/", &config).await?;
//!     eprintln!("{} pages, {} bytes", stats.total_pages, stats.total_jpeg_bytes);
//!     Ok(())
//! }
//! ```
//!
//! For selection and cancellation, drive a [`Session`]:
//!
//! ```rust,no_run
//! use pdf2jpg::{AppStatus, ConversionConfig, DirectorySink, Session};
//!
//! # async fn run() -> Result<(), pdf2jpg::Pdf2JpgError> {
//! let mut session = Session::with_pdfium(ConversionConfig::default());
//! if session.open_path(std::path::Path::new("report.pdf")).await? == AppStatus::Result {
//!     let first = session.pages()[0].id.clone();
//!     session.toggle_page(&first);
//!     let dispatcher = session.dispatcher(DirectorySink::new("out"));
//!     session.download_selected(&dispatcher).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2jpg` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2jpg = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod download;
pub mod error;
pub mod images;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod selection;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_sync, convert_to_dir, convert_to_dir_with};
pub use download::{file_name, DirectorySink, DownloadDispatcher, DownloadSink};
pub use error::{AppError, ErrorKind, Pdf2JpgError};
pub use images::{ImageHandle, ImageStore};
pub use output::{
    ConversionStats, ConvertedPage, PageId, PageSummary, ProcessingState, RunOutcome,
};
pub use pipeline::cancel::CancelToken;
pub use pipeline::render::{DocumentHandle, PdfiumRenderer, Renderer, RendererFactory};
pub use pipeline::runner::{PagePipeline, PageRun, PipelineState};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use selection::SelectionStore;
pub use session::{AppStatus, Canceller, Session};
