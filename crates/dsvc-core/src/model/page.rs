use serde::{Deserialize, Serialize};

/// One page of a collection read with stable ordering.
///
/// `page` is 1-based. `total` is the size of the whole collection at read
/// time so callers can compute the page count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    /// Zero-based row offset for a 1-based page number
    pub fn offset(page: u32, size: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(size)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Transform the page content, keeping the paging envelope
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            page: self.page,
            size: self.size,
            total: self.total,
            content: self.content.into_iter().map(f).collect(),
        }
    }
}
