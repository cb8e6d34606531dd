use serde::{Deserialize, Serialize};

pub const MAX_PAGE_LIMIT: i64 = 200;

/// `?page=&limit=` query parameters shared by every listing endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolve to a (page, limit) pair: page >= 1, limit clamped to 1..=200.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT);
        (page, limit)
    }
}

pub fn offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

/// Standard list-response envelope.
#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PageEnvelope<T> {
    pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        let q = PageQuery { page: None, limit: None };
        assert_eq!(q.resolve(50), (1, 50));
    }

    #[test]
    fn page_floor_is_one() {
        let q = PageQuery { page: Some(0), limit: Some(10) };
        assert_eq!(q.resolve(50), (1, 10));
        let q = PageQuery { page: Some(-3), limit: Some(10) };
        assert_eq!(q.resolve(50), (1, 10));
    }

    #[test]
    fn limit_is_clamped() {
        let q = PageQuery { page: Some(2), limit: Some(1000) };
        assert_eq!(q.resolve(50), (2, MAX_PAGE_LIMIT));
        let q = PageQuery { page: Some(2), limit: Some(0) };
        assert_eq!(q.resolve(50), (2, 1));
    }

    #[test]
    fn envelope_computes_paging_flags() {
        let env = PageEnvelope::new(vec![1, 2, 3], 2, 3, 7);
        assert_eq!(env.total_pages, 3);
        assert!(env.has_next);
        assert!(env.has_prev);

        let last = PageEnvelope::new(vec![7], 3, 3, 7);
        assert!(!last.has_next);

        let empty: PageEnvelope<i32> = PageEnvelope::new(vec![], 1, 50, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }
}
