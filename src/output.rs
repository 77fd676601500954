//! Result types produced by a conversion run.

use crate::download::file_name;
use crate::images::ImageHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a converted page, unique per conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(String);

impl PageId {
    pub(crate) fn new(page_num: usize, run_id: u64) -> Self {
        Self(format!("page-{page_num}-{run_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rasterised and JPEG-encoded page plus its selection state.
#[derive(Debug)]
pub struct ConvertedPage {
    pub id: PageId,
    /// 1-indexed page number.
    pub page_num: usize,
    /// Encoded JPEG bytes; released when the page is dropped.
    pub image: ImageHandle,
    /// Pixel width of the rendered page.
    pub width: u32,
    /// Pixel height of the rendered page.
    pub height: u32,
    /// Base name of the source document, without the `.pdf` extension.
    pub source_name: String,
    /// Whether the page is included in "download selected". Starts `true`.
    pub selected: bool,
}

impl ConvertedPage {
    /// File name this page is saved under, e.g. `report_p03.jpg`.
    pub fn file_name(&self) -> String {
        file_name(&self.source_name, self.page_num)
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            id: self.id.clone(),
            page_num: self.page_num,
            width: self.width,
            height: self.height,
            file_name: self.file_name(),
            jpeg_bytes: self.image.len(),
            selected: self.selected,
        }
    }
}

/// Serialisable view of a [`ConvertedPage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: PageId,
    pub page_num: usize,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub jpeg_bytes: usize,
    pub selected: bool,
}

/// Progress of the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Pages completed so far.
    pub current: usize,
    /// Pages in the document.
    pub total: usize,
}

impl ProcessingState {
    /// Completion as a percentage, 0–100.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.current.min(self.total) * 100) / self.total) as u8
    }
}

/// How a pipeline run ended, when it did not fail.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every page converted, in ascending page order.
    Completed(Vec<ConvertedPage>),
    /// The run was cancelled; nothing was kept.
    Cancelled,
}

/// Statistics for a finished run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub total_jpeg_bytes: u64,
    pub duration_ms: u64,
}
