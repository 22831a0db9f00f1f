//! Lazily paginated, append-only collections behind the three tabs.

use sptui_proto::catalog::{CatalogEntry, CatalogKind, Page};
use tracing::debug;

use crate::widgets::scrollable_list::{CursorMove, ScrollableList};

/// Fetch the next page once the cursor is fewer than this many rows from
/// the end of the loaded items.
pub const LOOKAHEAD: usize = 5;

pub struct Collection<T> {
    kind: CatalogKind,
    list: ScrollableList<T>,
    /// Offset of the first page received; later pages continue from it.
    first_offset: u32,
    total: u32,
    loaded: bool,
    fetching: bool,
}

impl<T: CatalogEntry> Collection<T> {
    pub fn new(kind: CatalogKind) -> Self {
        Self {
            kind,
            list: ScrollableList::new(),
            first_offset: 0,
            total: 0,
            loaded: false,
            fetching: false,
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.list.selected_item()
    }

    /// Mark the first-page request as in flight.
    pub fn begin_first_fetch(&mut self) {
        self.fetching = true;
    }

    /// Merge a page: items are appended in arrival order and the cursor
    /// keeps its index.
    pub fn append(&mut self, page: Page<T>) {
        if !self.loaded {
            self.first_offset = page.offset;
            self.loaded = true;
        }
        self.total = page.total;
        self.fetching = false;
        debug!(
            "{} page at offset {}: {} items ({} loaded of {})",
            self.kind.label(),
            page.offset,
            page.items.len(),
            self.list.len() + page.items.len(),
            self.total
        );
        self.list.extend(page.items);
    }
}

/// Kind-erased view of a collection, used by the tab handler and the UI.
pub trait TabView {
    fn is_loaded(&self) -> bool;
    fn is_fetching(&self) -> bool;
    fn len(&self) -> usize;
    fn total(&self) -> u32;
    fn cursor(&self) -> usize;
    fn move_cursor(&mut self, movement: CursorMove);
    /// Offset for the next page, or `None` when every item is loaded.
    fn next_offset(&self) -> Option<u32>;
    /// Claim the next-page fetch if the cursor is near the end. Returns the
    /// offset to request; `None` if not needed or one is already in flight.
    fn request_more(&mut self) -> Option<u32>;
    /// Claim a re-request of the first page after it failed. `None` once
    /// loaded or while a request is in flight.
    fn retry_first_page(&mut self) -> Option<u32>;
    /// Clear the in-flight flag after a failed fetch so the next scroll retries.
    fn fetch_failed(&mut self);
    /// (id, display name) of the entry under the cursor.
    fn selected_entry(&self) -> Option<(String, String)>;
    /// Display names of the rows visible in `height` rows, plus the index
    /// of the selected row within them.
    fn visible_rows(&mut self, height: usize) -> (Vec<String>, Option<usize>);
}

impl<T: CatalogEntry> TabView for Collection<T> {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn is_fetching(&self) -> bool {
        self.fetching
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn total(&self) -> u32 {
        self.total
    }

    fn cursor(&self) -> usize {
        self.list.selected
    }

    fn move_cursor(&mut self, movement: CursorMove) {
        self.list.apply(movement);
    }

    fn next_offset(&self) -> Option<u32> {
        let next = self.first_offset + self.list.len() as u32;
        (next < self.total).then_some(next)
    }

    fn request_more(&mut self) -> Option<u32> {
        if !self.loaded || self.fetching {
            return None;
        }
        if self.list.len() - self.list.selected >= LOOKAHEAD {
            return None;
        }
        let offset = self.next_offset()?;
        self.fetching = true;
        Some(offset)
    }

    fn retry_first_page(&mut self) -> Option<u32> {
        if self.loaded || self.fetching {
            return None;
        }
        self.fetching = true;
        Some(0)
    }

    fn fetch_failed(&mut self) {
        self.fetching = false;
    }

    fn selected_entry(&self) -> Option<(String, String)> {
        self.list
            .selected_item()
            .map(|e| (e.id().to_string(), e.display_name()))
    }

    fn visible_rows(&mut self, height: usize) -> (Vec<String>, Option<usize>) {
        self.list.ensure_visible(height);
        let rows: Vec<(usize, String)> = self
            .list
            .visible_items(height)
            .into_iter()
            .map(|(i, e)| (i, e.display_name()))
            .collect();
        let selected = rows.iter().position(|(i, _)| *i == self.list.selected);
        (rows.into_iter().map(|(_, name)| name).collect(), selected)
    }
}
