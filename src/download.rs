//! Saving converted pages.
//!
//! [`DownloadDispatcher`] decides *what* is saved and *when*; a
//! [`DownloadSink`] decides *where*. Multi-page downloads are paced: each
//! save after the first waits [`crate::config::DOWNLOAD_PACING`].

use crate::error::Pdf2JpgError;
use crate::output::ConvertedPage;
use crate::selection::SelectionStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Output file name for a page: `{base}_p{NN}.jpg`, page number zero-padded
/// to at least two digits.
pub fn file_name(base: &str, page_num: usize) -> String {
    format!("{base}_p{page_num:02}.jpg")
}

/// Destination for saved images.
pub trait DownloadSink {
    /// Save one file. A failure stops any multi-page download in progress.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), Pdf2JpgError>;
}

/// Writes files into a directory, creating it on first use.
///
/// Each file is written to a temp file in the same directory and renamed
/// into place, so a reader never sees a half-written JPEG.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), Pdf2JpgError> {
        let path = self.dir.join(file_name);
        let write_failed = |source: std::io::Error| Pdf2JpgError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_failed)?;
        tmp.write_all(bytes).map_err(write_failed)?;
        tmp.persist(&path).map_err(|e| write_failed(e.error))?;

        debug!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Saves one page, or every selected page with pacing between saves.
#[derive(Debug)]
pub struct DownloadDispatcher<S> {
    sink: S,
    pacing: Duration,
}

impl<S: DownloadSink> DownloadDispatcher<S> {
    pub fn new(sink: S, pacing: Duration) -> Self {
        Self { sink, pacing }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Save a single page under its file name.
    pub fn download_one(&self, page: &ConvertedPage) -> Result<(), Pdf2JpgError> {
        let name = page.file_name();
        let bytes = page.image.bytes().ok_or_else(|| {
            Pdf2JpgError::Internal(format!("image for page {} was released", page.page_num))
        })?;
        self.sink.save(&name, &bytes)
    }

    /// Save every selected page in ascending page order.
    ///
    /// Successive saves are separated by the pacing delay; there is no delay
    /// before the first save or after the last. Returns the number saved.
    pub async fn download_selected(&self, store: &SelectionStore) -> Result<usize, Pdf2JpgError> {
        let selected = store.selected();
        if selected.is_empty() {
            debug!("Nothing selected, no files saved");
            return Ok(0);
        }

        for (i, page) in selected.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            self.download_one(page)?;
        }

        info!("Saved {} selected pages", selected.len());
        Ok(selected.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageStore;
    use crate::output::PageId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        saves: Mutex<Vec<(String, tokio::time::Instant)>>,
    }

    impl DownloadSink for RecordingSink {
        fn save(&self, file_name: &str, _bytes: &[u8]) -> Result<(), Pdf2JpgError> {
            self.saves
                .lock()
                .unwrap()
                .push((file_name.to_string(), tokio::time::Instant::now()));
            Ok(())
        }
    }

    fn store_with(images: &ImageStore, n: usize) -> SelectionStore {
        let pages = (1..=n)
            .map(|p| ConvertedPage {
                id: PageId::new(p, 1),
                page_num: p,
                image: images.insert(vec![0xFF, 0xD8, p as u8]),
                width: 4,
                height: 4,
                source_name: "report".into(),
                selected: true,
            })
            .collect();
        let mut store = SelectionStore::new();
        store.replace(pages);
        store
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(file_name("report", 3), "report_p03.jpg");
        assert_eq!(file_name("report", 13), "report_p13.jpg");
        assert_eq!(file_name("converted", 1), "converted_p01.jpg");
    }

    #[tokio::test(start_paused = true)]
    async fn selected_downloads_are_paced_and_ordered() {
        let images = ImageStore::new();
        let mut store = store_with(&images, 5);
        store.set_all(false);
        for p in [4, 1, 3] {
            store.toggle(&PageId::new(p, 1));
        }

        let dispatcher =
            DownloadDispatcher::new(RecordingSink::default(), Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        let saved = dispatcher.download_selected(&store).await.unwrap();
        assert_eq!(saved, 3);

        let saves = dispatcher.sink().saves.lock().unwrap();
        let names: Vec<&str> = saves.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["report_p01.jpg", "report_p03.jpg", "report_p04.jpg"]);

        assert_eq!(saves[0].1, start);
        for pair in saves.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(500));
        }
        // No trailing delay after the last save.
        assert!(tokio::time::Instant::now() - start < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn nothing_selected_saves_nothing() {
        let images = ImageStore::new();
        let mut store = store_with(&images, 2);
        store.set_all(false);
        let dispatcher = DownloadDispatcher::new(RecordingSink::default(), Duration::ZERO);
        assert_eq!(dispatcher.download_selected(&store).await.unwrap(), 0);
        assert!(dispatcher.sink().saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let images = ImageStore::new();
        let store = store_with(&images, 2);

        let dispatcher = DownloadDispatcher::new(DirectorySink::new(&out), Duration::ZERO);
        assert_eq!(dispatcher.download_selected(&store).await.unwrap(), 2);

        let bytes = std::fs::read(out.join("report_p02.jpg")).unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 2]);
        assert!(out.join("report_p01.jpg").exists());
    }

    #[test]
    fn download_one_saves_single_page() {
        let images = ImageStore::new();
        let store = store_with(&images, 3);
        let dispatcher = DownloadDispatcher::new(RecordingSink::default(), Duration::ZERO);
        dispatcher.download_one(&store.pages()[1]).unwrap();
        let saves = dispatcher.sink().saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "report_p02.jpg");
    }

    #[test]
    fn sink_failure_is_output_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // A regular file where the directory should be.
        let sink = DirectorySink::new(&blocker);
        let err = sink.save("a.jpg", b"data").unwrap_err();
        assert!(matches!(err, Pdf2JpgError::OutputWriteFailed { .. }));
    }
}
