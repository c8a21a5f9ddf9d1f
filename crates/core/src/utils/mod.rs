//! Shared utilities: exact decimal arithmetic and paging helpers.

mod decimal;

pub use decimal::{parse_decimal, ratio, round_money, round_qty};

use serde::Serialize;

/// Paginated list response: `{count, results}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Total number of matching records before paging.
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Slices a full result set into one page. `page` is 1-based.
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let count = all.len();
        let page = page.max(1);
        let page_size = page_size.max(1);
        let start = (page - 1).saturating_mul(page_size).min(count);
        let end = start.saturating_add(page_size).min(count);
        let results = all.into_iter().skip(start).take(end - start).collect();
        Page { count, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slice_clamps_out_of_range() {
        let page = Page::slice(vec![1, 2, 3], 5, 2);
        assert_eq!(page.count, 3);
        assert!(page.results.is_empty());
    }

    #[test]
    fn page_slice_returns_requested_window() {
        let page = Page::slice(vec![1, 2, 3, 4, 5], 2, 2);
        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![3, 4]);
    }
}
