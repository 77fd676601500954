//! Per-page selection flags for the pages of the current run.

use crate::output::{ConvertedPage, PageId};
use tracing::{debug, warn};

/// Holds the converted pages of the most recent completed run.
///
/// Pages are kept in ascending page order. Replacing or clearing the store
/// drops the previous pages, which releases their image handles.
#[derive(Debug, Default)]
pub struct SelectionStore {
    pages: Vec<ConvertedPage>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current pages and store `pages` in their place.
    pub fn replace(&mut self, mut pages: Vec<ConvertedPage>) {
        pages.sort_by_key(|p| p.page_num);
        let previous = std::mem::replace(&mut self.pages, pages);
        debug!(
            "Selection replaced: {} → {} pages",
            previous.len(),
            self.pages.len()
        );
    }

    /// Discard every page.
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Flip the flag of page `id`. Returns the new flag, or `false` when no
    /// page has that id.
    pub fn toggle(&mut self, id: &PageId) -> bool {
        match self.pages.iter_mut().find(|p| &p.id == id) {
            Some(page) => {
                page.selected = !page.selected;
                page.selected
            }
            None => {
                warn!("Toggle ignored: no page with id {}", id);
                false
            }
        }
    }

    pub fn set_all(&mut self, selected: bool) {
        for page in &mut self.pages {
            page.selected = selected;
        }
    }

    /// Select everything, unless everything is already selected, in which
    /// case deselect everything. Returns the flag applied.
    pub fn toggle_all(&mut self) -> bool {
        let target = !self.is_all_selected();
        self.set_all(target);
        target
    }

    /// Selected pages, ascending by page number.
    pub fn selected(&self) -> Vec<&ConvertedPage> {
        self.pages.iter().filter(|p| p.selected).collect()
    }

    pub fn selected_count(&self) -> usize {
        self.pages.iter().filter(|p| p.selected).count()
    }

    /// `true` when there is at least one page and all are selected.
    pub fn is_all_selected(&self) -> bool {
        !self.pages.is_empty() && self.pages.iter().all(|p| p.selected)
    }

    pub fn pages(&self) -> &[ConvertedPage] {
        &self.pages
    }

    pub fn get(&self, id: &PageId) -> Option<&ConvertedPage> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageStore;

    fn pages(store: &ImageStore, nums: &[usize]) -> Vec<ConvertedPage> {
        nums.iter()
            .map(|&n| ConvertedPage {
                id: PageId::new(n, 1),
                page_num: n,
                image: store.insert(vec![0xFF, 0xD8, n as u8]),
                width: 10,
                height: 10,
                source_name: "doc".into(),
                selected: true,
            })
            .collect()
    }

    #[test]
    fn toggle_twice_restores_flag() {
        let images = ImageStore::new();
        let mut store = SelectionStore::new();
        store.replace(pages(&images, &[1, 2, 3]));
        let id = PageId::new(2, 1);

        assert!(!store.toggle(&id));
        assert_eq!(store.selected_count(), 2);
        assert!(store.toggle(&id));
        assert_eq!(store.selected_count(), 3);
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let images = ImageStore::new();
        let mut store = SelectionStore::new();
        store.replace(pages(&images, &[1, 2]));
        assert!(!store.toggle(&PageId::new(9, 1)));
        assert_eq!(store.selected_count(), 2);
    }

    #[test]
    fn set_all_then_clear_selection() {
        let images = ImageStore::new();
        let mut store = SelectionStore::new();
        store.replace(pages(&images, &[1, 2, 3, 4]));
        store.toggle(&PageId::new(3, 1));
        store.set_all(true);
        assert!(store.is_all_selected());
        store.set_all(false);
        assert!(store.selected().is_empty());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn toggle_all_selects_unless_all_selected() {
        let images = ImageStore::new();
        let mut store = SelectionStore::new();
        store.replace(pages(&images, &[1, 2]));

        assert!(!store.toggle_all());
        assert_eq!(store.selected_count(), 0);

        store.toggle(&PageId::new(1, 1));
        assert!(store.toggle_all());
        assert!(store.is_all_selected());
    }

    #[test]
    fn empty_store_is_not_all_selected() {
        let store = SelectionStore::new();
        assert!(!store.is_all_selected());
        assert!(store.is_empty());
    }

    #[test]
    fn selected_is_in_page_order() {
        let images = ImageStore::new();
        let mut store = SelectionStore::new();
        store.replace(pages(&images, &[3, 1, 2]));
        let nums: Vec<usize> = store.selected().iter().map(|p| p.page_num).collect();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn replace_and_clear_release_handles() {
        let images = ImageStore::new();
        let mut store = SelectionStore::new();
        store.replace(pages(&images, &[1, 2, 3]));
        assert_eq!(images.live_count(), 3);

        store.replace(pages(&images, &[1]));
        assert_eq!(images.live_count(), 1);

        store.clear();
        assert_eq!(images.live_count(), 0);
        assert!(store.get(&PageId::new(1, 1)).is_none());
    }
}
