//! Pipeline stages for PDF-to-JPEG conversion.
//!
//! Each submodule implements one step; [`runner`] strings them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ images
//! (type)    (pdfium)   (JPEG)     (handles)
//!             ▲
//!           runner ◀── cancel
//! ```
//!
//! 1. [`input`]: validate the declared media type and derive the base name
//! 2. [`render`]: parse bytes and rasterise page N; pdfium is not `Send`,
//!    so renderers are built on the worker thread
//! 3. [`encode`]: flatten to RGB and JPEG-encode each page
//! 4. [`runner`]: the per-document state machine (page-limit checks,
//!    lazy page iteration, progress events, all-or-nothing results)
//! 5. [`cancel`]: the flag the runner polls between pages

pub mod cancel;
pub mod encode;
pub mod input;
pub mod render;
pub mod runner;
