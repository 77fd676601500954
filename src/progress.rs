//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline converts each page.
//!
//! The pipeline reports synchronously after each page completes and before
//! the next one starts, so `on_page_complete` observes strictly increasing
//! page numbers, never skipping or repeating one. Events are posted from the
//! pipeline's worker thread, hence the `Send + Sync` bound.
//!
//! # Example
//!
//! ```rust
//! use pdf2jpg::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done", page_num, total_pages);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the page pipeline as it converts each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document loaded and passed the page-count checks.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page has been rasterised, encoded and stored.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number, equal to the number of pages done so far
    /// * `total_pages`: total pages in the document
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a cancellation was observed before `completed + 1` started.
    fn on_conversion_cancelled(&self, completed: usize, total_pages: usize) {
        let _ = (completed, total_pages);
    }

    /// Called when a page failed; the run is discarded.
    fn on_conversion_failed(&self, page_num: usize, error: &str) {
        let _ = (page_num, error);
    }

    /// Called once after every page converted.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
