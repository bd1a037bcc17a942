//! Client-side paging over a fetched list

use crate::config::DEFAULT_PAGE_SIZE;

/// 1-based page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    per_page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    /// A `per_page` of zero is treated as one
    pub fn new(per_page: usize) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.per_page)
    }

    /// Rows of the current page; empty when the page is past the end
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.per_page).min(items.len());
        let end = start.saturating_add(self.per_page).min(items.len());
        &items[start..end]
    }

    pub fn next(&mut self, len: usize) -> usize {
        let last = self.total_pages(len).max(1);
        self.page = (self.page + 1).min(last);
        self.page
    }

    pub fn previous(&mut self) -> usize {
        self.page = self.page.saturating_sub(1).max(1);
        self.page
    }

    pub fn go_to(&mut self, page: usize, len: usize) -> usize {
        let last = self.total_pages(len).max(1);
        self.page = page.clamp(1, last);
        self.page
    }

    /// Pulls the cursor back after the list shrank
    pub fn clamp(&mut self, len: usize) {
        let last = self.total_pages(len).max(1);
        if self.page > last {
            self.page = last;
        }
    }
}
