use serde::Serialize;
use std::ops::Range;

pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Clamp into `[1, max(total, 1)]`.
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// `[(p-1)*n, p*n)` clipped to `len`. Out-of-range pages give an empty range.
pub fn page_bounds(len: usize, page_size: usize, page: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= len {
        return len..len;
    }
    let end = std::cmp::min(start.saturating_add(page_size), len);
    start..end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based position of the first row on this page, 0 when empty.
    pub first_item: usize,
    pub last_item: usize,
}

impl PageInfo {
    pub fn new(len: usize, page_size: usize, page: usize) -> Self {
        let bounds = page_bounds(len, page_size, page);
        let (first_item, last_item) = if bounds.is_empty() {
            (0, 0)
        } else {
            (bounds.start + 1, bounds.end)
        };
        Self {
            page,
            page_size,
            total_pages: total_pages(len, page_size),
            total_items: len,
            first_item,
            last_item,
        }
    }
}
