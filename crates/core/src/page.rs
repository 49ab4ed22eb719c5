//! Offset pagination computed from server-side counts.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Requested page (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from optional transport values; zero or missing values fall back to defaults.
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self::with_default_limit(page, limit, DEFAULT_PAGE_LIMIT)
    }

    pub fn with_default_limit(page: Option<usize>, limit: Option<usize>, default_limit: usize) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit.filter(|l| *l > 0).unwrap_or(default_limit.max(1)),
        }
    }

    pub fn offset(&self) -> usize {
        self.limit.saturating_mul(self.page.saturating_sub(1))
    }

    /// Slice an already-filtered, already-ordered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total_count = items.len();
        let total_pages = total_count.div_ceil(self.limit);
        let items = items.into_iter().skip(self.offset()).take(self.limit).collect();
        Page {
            items,
            total_pages,
            total_count,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}
