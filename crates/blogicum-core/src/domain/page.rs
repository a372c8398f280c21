use serde::Serialize;

/// Number of posts on every feed page.
pub const PAGE_SIZE: u64 = 10;

/// A requested 1-based page number, as read from `?page=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
}

impl PageRequest {
    pub fn new(number: Option<u64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
        }
    }

    pub fn first() -> Self {
        Self { number: 1 }
    }

    /// Resolve against the total number of items.
    ///
    /// Numbers past the end land on the last page; an empty listing still has
    /// one (empty) page.
    pub fn resolve(self, total_items: u64) -> PageWindow {
        let total_pages = total_items.div_ceil(PAGE_SIZE).max(1);
        let number = self.number.clamp(1, total_pages);
        PageWindow {
            number,
            total_pages,
            total_items,
            offset: (number - 1) * PAGE_SIZE,
            limit: PAGE_SIZE,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// The slice of a listing a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn fill<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            has_next: self.number < self.total_pages,
            has_previous: self.number > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}
