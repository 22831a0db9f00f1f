//! Generic scrollable list: items, a cursor and a scroll window.

/// One cursor movement, already decoded from a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up(usize),
    Down(usize),
    First,
    Last,
}

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.clamp_selection();
    }

    /// Append items at the end. The cursor keeps its index.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        let selected = self.selected;
        self.items.extend(items);
        self.select(selected);
    }

    pub fn select(&mut self, idx: usize) {
        self.selected = idx;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub fn apply(&mut self, movement: CursorMove) {
        match movement {
            CursorMove::Up(n) => self.select_up(n),
            CursorMove::Down(n) => self.select_down(n),
            CursorMove::First => self.select_first(),
            CursorMove::Last => self.select_last(),
        }
    }

    pub fn select_up(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len().saturating_sub(1));
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Returns (index, &item) pairs visible in `height` rows.
    /// Call ensure_visible first to update scroll_offset.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        if height == 0 || self.items.is_empty() {
            return Vec::new();
        }
        let start = self.scroll_offset.min(self.items.len());
        let end = (start + height).min(self.items.len());
        (start..end).map(|i| (i, &self.items[i])).collect()
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected.saturating_sub(height - 1);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_keeps_cursor_index() {
        let mut list = ScrollableList::new();
        list.set_items(vec![1, 2, 3]);
        list.select_down(2);
        list.extend(vec![4, 5]);
        assert_eq!(list.selected, 2);
        assert_eq!(list.items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn movement_is_clamped() {
        let mut list = ScrollableList::new();
        list.set_items((0..10).collect());
        list.apply(CursorMove::Down(25));
        assert_eq!(list.selected, 9);
        list.apply(CursorMove::Up(3));
        assert_eq!(list.selected, 6);
        list.apply(CursorMove::First);
        assert_eq!(list.selected, 0);
        list.apply(CursorMove::Up(1));
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn window_follows_cursor() {
        let mut list = ScrollableList::new();
        list.set_items((0..10).collect::<Vec<u32>>());
        list.select_last();
        list.ensure_visible(4);
        assert_eq!(list.scroll_offset, 6);
        let visible: Vec<usize> = list.visible_items(4).into_iter().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![6, 7, 8, 9]);
    }
}
