//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct, input normalization and the `Page` result.

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Clamp to sane values: page >= 1, 1 <= page_size <= max_page_size
    pub fn normalize(self, max_page_size: u32) -> Self {
        let page = if self.page == 0 { 1 } else { self.page };
        let page_size = self.page_size.clamp(1, max_page_size.max(1));
        Self { page, page_size }
    }

    /// Zero-based offset of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, page_size: 10 } }
}

/// One page of an ordered result set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Slice an already ordered collection; `pagination` must be normalized.
    pub fn slice(all: Vec<T>, pagination: Pagination) -> Self {
        let total_count = all.len();
        let page_size = pagination.page_size.max(1);
        let total_pages = total_count.div_ceil(page_size as usize) as u32;
        let items = all
            .into_iter()
            .skip(pagination.offset())
            .take(page_size as usize)
            .collect();
        Self { items, total_count, current_page: pagination.page, total_pages, page_size }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            current_page: self.current_page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}
