//! Page/limit handling shared by every list endpoint

use serde::Deserialize;
use utoipa::IntoParams;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// `page` (1-based) and `limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 10, max: 100)
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    /// Saturates for absurd page numbers; such windows are simply empty
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// One window of a filtered result set
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of rows matching the filters, across all pages
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, query: &PageQuery) -> Self {
        Self {
            items,
            total,
            page: query.page(),
            limit: query.limit(),
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.total <= 0 {
            0
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let q = PageQuery::default();
        assert_eq!((q.page(), q.limit(), q.offset()), (1, DEFAULT_LIMIT, 0));

        let q = PageQuery::new(0, -5);
        assert_eq!((q.page(), q.limit()), (1, DEFAULT_LIMIT));

        let q = PageQuery::new(3, 1000);
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.offset(), 200);
    }

    #[test]
    fn test_windows_do_not_overlap_and_cover_everything() {
        let rows: Vec<i64> = (0..47).collect();
        let limit = 10;
        let mut seen = Vec::new();

        for page in 1..=5 {
            let q = PageQuery::new(page, limit);
            let window: Vec<i64> = rows
                .iter()
                .skip(q.offset() as usize)
                .take(q.limit() as usize)
                .copied()
                .collect();
            let expected_len = if page < 5 { 10 } else { 7 };
            assert_eq!(window.len(), expected_len, "page {}", page);
            assert!(window.iter().all(|r| !seen.contains(r)));
            seen.extend(window);
        }

        assert_eq!(seen, rows);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let q = PageQuery::new(i64::MAX, 10);
        assert_eq!(q.page(), i64::MAX);
        assert_eq!(q.offset(), i64::MAX);

        let q = PageQuery::new(i64::MAX, MAX_LIMIT);
        assert!(q.offset() >= 0);
    }

    #[test]
    fn test_total_pages() {
        let q = PageQuery::new(1, 10);
        assert_eq!(Page::<()>::new(vec![], 0, &q).total_pages(), 0);
        assert_eq!(Page::<()>::new(vec![], 10, &q).total_pages(), 1);
        assert_eq!(Page::<()>::new(vec![], 11, &q).total_pages(), 2);
    }
}
