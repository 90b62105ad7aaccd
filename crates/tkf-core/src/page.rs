//! Offset/limit pagination

use serde::{Deserialize, Serialize};

/// One page of an insertion-ordered sequence plus the sequence's total length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the requested window
    pub items: Vec<T>,
    /// Total number of items in the sequence
    pub total: usize,
}

impl<T: Clone> Page<T> {
    /// Cut the window `[offset, offset + limit)` out of `source`
    ///
    /// Offsets past the end yield an empty page, never an error.
    #[must_use]
    pub fn slice(source: &[T], offset: usize, limit: usize) -> Self {
        let total = source.len();
        let start = offset.min(total);
        let end = start.saturating_add(limit).min(total);
        Self {
            items: source[start..end].to_vec(),
            total,
        }
    }
}

impl<T> Page<T> {
    /// Number of items in this page
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
