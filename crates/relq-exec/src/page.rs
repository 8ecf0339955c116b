//! Result paging.

use serde::Serialize;

/// One window of a paged result set.
///
/// `total` comes from the count plan and counts all matching rows, not just
/// this window; the navigation predicates are derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// The rows of this window.
    pub items: Vec<T>,
    /// Total matching rows across all windows.
    pub total: u64,
    /// Rows skipped before this window.
    pub offset: u64,
    /// Requested window size (the window may hold fewer rows).
    pub limit: u64,
}

impl<T> Page<T> {
    /// Whether rows exist beyond this window.
    pub fn has_next(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }

    /// Whether rows exist before this window.
    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    /// Whether this is the first window.
    pub fn is_first(&self) -> bool {
        self.offset == 0
    }

    /// Whether this is the last window.
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Zero-based page number, when windows are aligned to `limit`.
    pub fn number(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.offset / self.limit
    }

    /// Total number of windows of size `limit`.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return if self.total > 0 { 1 } else { 0 };
        }
        self.total.div_ceil(self.limit)
    }

    /// Convert the items, keeping the window geometry.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
